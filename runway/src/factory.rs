use crate::{FadeFrame, Size};

/// The rendering capability the engine drives.
///
/// Implementations own node *content* (templates, styling, data binding). The engine owns the
/// attach/detach lifecycle: it decides which nodes exist, which slot each one serves, where it
/// sits, and when it is destroyed. Implementations must not move nodes between slots on their
/// own.
///
/// All methods are infallible. A renderer that can fail should degrade on its side (e.g. render
/// an empty node) rather than report errors back into layout.
pub trait ViewFactory {
    /// The application data bound to a node.
    type Item;
    /// An opaque handle to a rendered node.
    type Node;

    /// Creates a node bound to `item`. `count` is the current item count.
    fn create(&mut self, item: &Self::Item, index: usize, count: usize) -> Self::Node;

    /// Creates a placeholder node with no data binding.
    fn create_tombstone(&mut self) -> Self::Node;

    /// Rebinds a recycled node to different data.
    fn rebind(&mut self, node: &mut Self::Node, item: &Self::Item, index: usize, count: usize);

    /// Inserts the node into the layout flow, absolutely positioned.
    fn attach(&mut self, node: &mut Self::Node, index: usize);

    /// Removes the node from the layout flow. The node must stay alive.
    fn detach(&mut self, node: &mut Self::Node);

    /// Reads the committed size of an attached node.
    fn measure(&mut self, node: &Self::Node) -> Size;

    /// Moves the node to `top` pixels from the start of the list.
    fn set_position(&mut self, node: &mut Self::Node, top: u64);

    fn set_visible(&mut self, node: &mut Self::Node, visible: bool);

    /// Applies one frame of a tombstone → content cross-fade.
    fn set_fade(&mut self, node: &mut Self::Node, frame: FadeFrame) {
        let _ = (node, frame);
    }

    /// Releases every resource owned by the node. Irreversible.
    fn destroy(&mut self, node: Self::Node);
}
