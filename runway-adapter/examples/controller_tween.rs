use runway::{Change, RunwayOptions, Size, ViewFactory};
use runway_adapter::{Controller, Easing};

struct Tiles;

impl ViewFactory for Tiles {
    type Item = u32;
    type Node = u32;

    fn create(&mut self, item: &u32, _index: usize, _count: usize) -> u32 {
        *item
    }

    fn create_tombstone(&mut self) -> u32 {
        u32::MAX
    }

    fn rebind(&mut self, node: &mut u32, item: &u32, _index: usize, _count: usize) {
        *node = *item;
    }

    fn attach(&mut self, _node: &mut u32, _index: usize) {}

    fn detach(&mut self, _node: &mut u32) {}

    fn measure(&mut self, _node: &u32) -> Size {
        Size::new(120, 120)
    }

    fn set_position(&mut self, _node: &mut u32, _top: u64) {}

    fn set_visible(&mut self, _node: &mut u32, _visible: bool) {}

    fn destroy(&mut self, _node: u32) {}
}

fn main() {
    // Example: a 4-column photo grid below a 250px header, scrolled programmatically.
    //
    // An adapter would:
    // - start a tween (e.g. in response to "jump to photo" command)
    // - call tick(now_ms) in a frame loop / timer
    // - apply the returned offset to the real scroll container
    let options = RunwayOptions::fixed(120)
        .with_columns(4)
        .with_has_more(false);
    let mut c = Controller::new(options, Tiles).with_scroll_margin(250);
    c.on_viewport(Size::new(480, 720), 0);
    c.apply_changes(
        (0..10_000u32).map(|item| Change::Insert {
            index: item as usize,
            item,
        }),
        0,
    );

    let target = c.start_tween_to_index(6_000, 0, 400, Easing::EaseInOutCubic);
    println!("target_offset={target}");

    let mut now_ms = 0u64;
    while c.is_animating() {
        now_ms += 16;
        if let Some(off) = c.tick(now_ms) {
            if now_ms % 80 == 0 {
                println!(
                    "t={now_ms} off={off} range={:?}",
                    c.runway().attached_range()
                );
            }
        }
    }

    now_ms += 250;
    c.tick(now_ms);
    println!(
        "done: off={} anchor={:?} phase={:?}",
        c.raw_offset(),
        c.runway().anchor(),
        c.phase()
    );
}
