// Example: a measured list driven through scroll → layout → commit.
use runway::{FadeFrame, Runway, RunwayOptions, Size, ViewFactory};

/// A stand-in renderer: each node is a row of text whose height depends on its length.
#[derive(Default)]
struct Rows {
    created: usize,
    rebinds: usize,
}

struct Row {
    text: String,
}

impl ViewFactory for Rows {
    type Item = String;
    type Node = Row;

    fn create(&mut self, item: &String, _index: usize, _count: usize) -> Row {
        self.created += 1;
        Row { text: item.clone() }
    }

    fn create_tombstone(&mut self) -> Row {
        Row {
            text: String::from("…"),
        }
    }

    fn rebind(&mut self, node: &mut Row, item: &String, _index: usize, _count: usize) {
        self.rebinds += 1;
        node.text.clone_from(item);
    }

    fn attach(&mut self, _node: &mut Row, _index: usize) {}

    fn detach(&mut self, _node: &mut Row) {}

    fn measure(&mut self, node: &Row) -> Size {
        // 20px per started 40 characters.
        let lines = node.text.len().div_ceil(40).max(1) as u32;
        Size::new(400, lines * 20)
    }

    fn set_position(&mut self, _node: &mut Row, _top: u64) {}

    fn set_visible(&mut self, _node: &mut Row, _visible: bool) {}

    fn set_fade(&mut self, _node: &mut Row, _frame: FadeFrame) {}

    fn destroy(&mut self, _node: Row) {}
}

fn main() {
    let options = RunwayOptions::new()
        .with_tombstone_height(20)
        .with_has_more(false)
        .with_on_extent_change(Some(|extent: u64| println!("extent={extent}")));
    let mut rw = Runway::new(options, Rows::default());

    rw.on_resize(Size::new(400, 600), 0);
    rw.append((0..10_000).map(|i| "lorem ipsum ".repeat(i % 9)), 0);
    let r = rw.commit(16);
    println!("first pass: range={:?} measured={}", r.range, r.measured);

    let mut offset = 0u64;
    for frame in 1..=60u64 {
        offset += 400;
        let now = frame * 16;
        rw.on_scroll(offset, now);
        if let Some(corrected) = rw.commit(now).scroll_correction {
            // A real host writes this back to its scroll container.
            offset = corrected;
        }
    }

    println!(
        "after scrolling: offset={} anchor={:?} range={:?}",
        rw.scroll_offset(),
        rw.anchor(),
        rw.attached_range()
    );
    println!(
        "nodes created={} rebinds={} pooled={}",
        rw.factory().created,
        rw.factory().rebinds,
        rw.pool_len()
    );

    let r = rw.scroll_to_index(9_000, 1_000);
    println!("scroll_to_index(9000): offset={:?}", r.scroll_correction);
}
