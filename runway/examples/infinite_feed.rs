// Example: an endless feed. Slots are reserved as placeholders when a page is requested and
// filled in when the page "arrives"; tombstones cross-fade into content.
use std::sync::{Arc, Mutex};

use runway::{Change, FadeFrame, LoadRequest, Runway, RunwayOptions, Size, ViewFactory};

const PAGE: usize = 20;

#[derive(Default)]
struct Cards {
    tombstones: usize,
    fades: usize,
}

impl ViewFactory for Cards {
    type Item = u64;
    type Node = Option<u64>;

    fn create(&mut self, item: &u64, _index: usize, _count: usize) -> Option<u64> {
        Some(*item)
    }

    fn create_tombstone(&mut self) -> Option<u64> {
        self.tombstones += 1;
        None
    }

    fn rebind(&mut self, node: &mut Option<u64>, item: &u64, _index: usize, _count: usize) {
        *node = Some(*item);
    }

    fn attach(&mut self, _node: &mut Option<u64>, _index: usize) {}

    fn detach(&mut self, _node: &mut Option<u64>) {}

    fn measure(&mut self, node: &Option<u64>) -> Size {
        let h = node.map_or(80, |id| 60 + (id % 5) as u32 * 30);
        Size::new(360, h)
    }

    fn set_position(&mut self, _node: &mut Option<u64>, _top: u64) {}

    fn set_visible(&mut self, _node: &mut Option<u64>, _visible: bool) {}

    fn set_fade(&mut self, _node: &mut Option<u64>, _frame: FadeFrame) {
        self.fades += 1;
    }

    fn destroy(&mut self, _node: Option<u64>) {}
}

fn main() {
    let requests: Arc<Mutex<Vec<LoadRequest>>> = Arc::default();
    let sink = Arc::clone(&requests);
    let options = RunwayOptions::new()
        .with_max_tombstones(8)
        .with_on_load_more(Some(move |req: LoadRequest| {
            if let Ok(mut q) = sink.lock() {
                q.push(req);
            }
        }));
    let mut rw = Runway::new(options, Cards::default());
    rw.on_resize(Size::new(360, 800), 0);

    // Pages the "server" is working on: (first slot, ready at).
    let mut pending: Vec<(usize, u64)> = Vec::new();

    // An empty list never reaches a horizon: seed the first page.
    rw.apply_changes((0..PAGE).map(|index| Change::Placeholder { index }), 0);
    pending.push((0, 300));
    let mut offset = 0u64;

    for frame in 0..400u64 {
        let now = frame * 16;

        let fresh: Vec<LoadRequest> = match requests.lock() {
            Ok(mut q) => q.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        for req in fresh {
            // Reserve the slots right away so the user can keep scrolling into tombstones.
            let start = rw.item_count();
            rw.apply_changes(
                (start..start + PAGE).map(|index| Change::Placeholder { index }),
                now,
            );
            pending.push((start, now + 300));
            println!("t={now} load #{} -> slots {start}..{}", req.ticket, start + PAGE);
        }

        while let Some(pos) = pending.iter().position(|&(_, ready)| ready <= now) {
            let (start, _) = pending.swap_remove(pos);
            rw.apply_changes(
                (start..start + PAGE).map(|index| Change::Update {
                    index,
                    item: index as u64,
                }),
                now,
            );
        }

        offset += 120;
        rw.on_scroll(offset, now);
        if let Some(corrected) = rw.commit(now).scroll_correction {
            offset = corrected;
        }
        rw.tick(now);
    }

    println!(
        "items={} range={:?} extent={} visible_tombstones={}",
        rw.item_count(),
        rw.attached_range(),
        rw.extent(),
        rw.visible_tombstones()
    );
    println!(
        "tombstones created={} fade frames={}",
        rw.factory().tombstones,
        rw.factory().fades
    );
}
