//! Test fixtures for integration tests
//!
//! Sample transcripts in both supported line formats

/// Upbeat stand-up, colon format
pub const STANDUP_TRANSCRIPT: &str = "\
Priya: Good morning everyone, thanks for joining.
Marco: Morning! The release went great and the customers are happy.
Priya: Excellent work. Any blockers?
Marco: Nothing major, the new dashboard looks good.
Lena: I finished the migration, really nice progress this week!
";

/// Tense retro, timestamped format
pub const RETRO_TRANSCRIPT: &str = "\
[14:00] priya: This sprint was terrible.
[14:01] MARCO: The build is broken again and I am frustrated.
[14:02] lena: Deploys were awful all week.
[14:03] Priya: Honestly I might resign if this keeps up.
[14:05:30] marco: Okay, let's list the action items.
";

/// Ten units, seven clearly negative
pub const SPIKE_LINES: [&str; 10] = [
    "This is terrible.",
    "The build is broken.",
    "Deploys were awful.",
    "I am frustrated.",
    "The demo was bad.",
    "The tooling is terrible.",
    "Everything is broken.",
    "The meeting starts at noon.",
    "We ship on Friday.",
    "Thanks for the update.",
];
