use runway::{Change, RunwayOptions, Size, ViewFactory};
use runway_adapter::Controller;

struct Messages;

impl ViewFactory for Messages {
    type Item = &'static str;
    type Node = ();

    fn create(&mut self, _item: &&'static str, _index: usize, _count: usize) {}

    fn create_tombstone(&mut self) {}

    fn rebind(&mut self, _node: &mut (), _item: &&'static str, _index: usize, _count: usize) {}

    fn attach(&mut self, _node: &mut (), _index: usize) {}

    fn detach(&mut self, _node: &mut ()) {}

    fn measure(&mut self, _node: &()) -> Size {
        Size::new(300, 48)
    }

    fn set_position(&mut self, _node: &mut (), _top: u64) {}

    fn set_visible(&mut self, _node: &mut (), _visible: bool) {}

    fn destroy(&mut self, _node: ()) {}
}

fn main() {
    // Example: keep the message the user is reading in place while the list is re-sorted.
    //
    // The adapter flow is typically:
    // 1) capture an anchor (item identity + offset) before data changes
    // 2) apply data changes
    // 3) apply the anchor so the same message stays in the same place
    let mut c = Controller::new(RunwayOptions::fixed(48).with_has_more(false), Messages);
    c.on_viewport(Size::new(300, 480), 0);
    c.apply_changes(
        (0..500).map(|index| Change::Insert {
            index,
            item: "hello",
        }),
        0,
    );
    c.on_scroll(4_820, 0);

    let anchor = c.capture_anchor().expect("list is not empty");
    println!("before: off={} anchor={anchor:?}", c.raw_offset());

    // A "pinned" message jumps to the top; the one being read moves down by one.
    c.apply_changes([Change::Move { from: 300, to: 0 }], 0);
    // Another moves from above the reader to far below.
    c.apply_changes([Change::Move { from: 5, to: 450 }], 0);

    let off = c.apply_anchor(&anchor, 0);
    println!("after: off={off:?} anchor={:?}", c.runway().anchor());
}
