//! Auto-display vs list-display decision

use super::result::{DisplayMode, ToolKind};

/// Decide how a result set should be presented
///
/// `singular_hint` is the agent's explicit single-target flag (`auto_play` for
/// video search, `auto_display` for web and image search).
pub fn classify(kind: ToolKind, singular_hint: bool, result_count: usize) -> DisplayMode {
    match kind {
        ToolKind::Encyclopedia | ToolKind::Weather | ToolKind::Financial => {
            DisplayMode::AutoDisplay
        },
        ToolKind::WebSearch | ToolKind::ImageSearch | ToolKind::VideoSearch => {
            if singular_hint || result_count == 1 {
                DisplayMode::AutoDisplay
            } else {
                DisplayMode::ListDisplay
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encyclopedia_always_auto() {
        assert_eq!(classify(ToolKind::Encyclopedia, false, 0), DisplayMode::AutoDisplay);
        assert_eq!(classify(ToolKind::Encyclopedia, false, 5), DisplayMode::AutoDisplay);
    }

    #[test]
    fn test_search_kinds() {
        for kind in [ToolKind::WebSearch, ToolKind::ImageSearch, ToolKind::VideoSearch] {
            assert_eq!(classify(kind, false, 3), DisplayMode::ListDisplay);
            assert_eq!(classify(kind, true, 3), DisplayMode::AutoDisplay);
            assert_eq!(classify(kind, false, 1), DisplayMode::AutoDisplay);
        }
    }

    #[test]
    fn test_single_record_kinds() {
        assert_eq!(classify(ToolKind::Weather, false, 7), DisplayMode::AutoDisplay);
        assert_eq!(classify(ToolKind::Financial, false, 1), DisplayMode::AutoDisplay);
    }
}
