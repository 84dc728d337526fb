//! Channel list normalization.

/// Channels always made available to the primary solver.
pub const DEFAULT_CHANNELS: [&str; 2] = [
    "https://repo.prefix.dev/emscripten-forge-dev",
    "https://repo.prefix.dev/conda-forge",
];

/// Short channel names and the URLs they stand for.
pub const CHANNEL_ALIASES: [(&str, &str); 2] = [
    (
        "emscripten-forge-dev",
        "https://repo.prefix.dev/emscripten-forge-dev",
    ),
    ("conda-forge", "https://repo.prefix.dev/conda-forge"),
];

const DEFAULTS_KEYWORD: &str = "defaults";

/// Strip surrounding whitespace and trailing slashes from a channel URL.
#[must_use]
pub fn normalize_channel(channel: &str) -> String {
    channel
        .trim_start()
        .trim_end_matches(|c: char| c == '/' || c.is_whitespace())
        .to_string()
}

fn alias_url(name: &str) -> Option<&'static str> {
    CHANNEL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, url)| *url)
}

fn push_unique(out: &mut Vec<String>, channel: String) {
    if !out.contains(&channel) {
        out.push(channel);
    }
}

/// Build the channel list sent to the primary solver.
///
/// The default channels are always included. Aliases expand to their URLs,
/// `defaults` expands to the default list, and duplicates are dropped while
/// keeping first-seen order. Explicit URLs come first, then defaults, then
/// alias expansions.
#[must_use]
pub fn format_channels<S: AsRef<str>>(channels: &[S]) -> Vec<String> {
    let mut requested: Vec<String> = Vec::new();
    for channel in channels {
        push_unique(&mut requested, channel.as_ref().trim().to_string());
    }
    for channel in DEFAULT_CHANNELS {
        push_unique(&mut requested, channel.to_string());
    }

    let mut has_defaults = false;
    let mut aliases = Vec::new();
    let mut out = Vec::new();
    for channel in &requested {
        if channel == DEFAULTS_KEYWORD {
            has_defaults = true;
        } else if let Some(url) = alias_url(channel) {
            aliases.push(url);
        } else if !channel.is_empty() {
            push_unique(&mut out, normalize_channel(channel));
        }
    }

    if has_defaults {
        for channel in DEFAULT_CHANNELS {
            push_unique(&mut out, channel.to_string());
        }
    }
    for url in aliases {
        push_unique(&mut out, url.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_list_yields_defaults() {
        let channels: [&str; 0] = [];
        assert_eq!(format_channels(&channels), DEFAULT_CHANNELS.to_vec());
    }

    #[test]
    fn custom_channels_come_first_and_defaults_are_appended() {
        let channels = format_channels(&["https://prefix.dev/my-channel/ "]);
        assert_eq!(
            channels,
            vec![
                "https://prefix.dev/my-channel",
                "https://repo.prefix.dev/emscripten-forge-dev",
                "https://repo.prefix.dev/conda-forge",
            ]
        );
    }

    #[test]
    fn aliases_and_defaults_expand_without_duplicates() {
        let channels = format_channels(&["conda-forge", "defaults", "emscripten-forge-dev"]);
        assert_eq!(channels, DEFAULT_CHANNELS.to_vec());
    }

    #[test]
    fn normalizes_trailing_slashes() {
        assert_eq!(
            normalize_channel("https://repo.prefix.dev/conda-forge//"),
            "https://repo.prefix.dev/conda-forge"
        );
    }
}
