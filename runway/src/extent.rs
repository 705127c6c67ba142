/// Tracks the published scroll extent.
///
/// The content part never shrinks while items are only being measured (a measured item
/// replacing a taller estimate keeps the old extent); it may shrink after removals or a full
/// re-measure, signalled through [`ExtentPublisher::allow_shrink`]. Slack is added on top and
/// may come and go freely.
#[derive(Clone, Debug, Default)]
pub(crate) struct ExtentPublisher {
    published: Option<u64>,
    content_floor: u64,
    shrink_allowed: bool,
}

impl ExtentPublisher {
    pub(crate) fn allow_shrink(&mut self) {
        self.shrink_allowed = true;
    }

    /// Returns the new extent if it differs from the last published one.
    pub(crate) fn update(&mut self, content: u64, slack: u64) -> Option<u64> {
        let content = if self.shrink_allowed {
            content
        } else {
            content.max(self.content_floor)
        };
        self.shrink_allowed = false;
        self.content_floor = content;

        let extent = content.saturating_add(slack);
        if self.published == Some(extent) {
            return None;
        }
        self.published = Some(extent);
        Some(extent)
    }

    pub(crate) fn current(&self) -> u64 {
        self.published.unwrap_or(0)
    }
}
