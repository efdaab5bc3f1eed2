/// Built-in deny-list, applied unless a config opts out with
/// [`ModerationConfig::empty`](super::ModerationConfig::empty).
pub const DEFAULT_DENIED_WORDS: &[&str] = &[
    "arse",
    "arsehole",
    "ass",
    "asshole",
    "bastard",
    "bitch",
    "bollocks",
    "bullshit",
    "cock",
    "cunt",
    "dick",
    "dickhead",
    "fuck",
    "fucked",
    "fucker",
    "fucking",
    "motherfucker",
    "piss",
    "prick",
    "shit",
    "shitty",
    "slut",
    "twat",
    "wanker",
    "whore",
];
