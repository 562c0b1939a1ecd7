#![no_main]

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use libfuzzer_sys::fuzz_target;
use libutils::fifo::RingFifo;

#[derive(arbitrary::Arbitrary, Debug)]
enum Op {
    Push(u16),
    ForcedPush(u16),
    Pop,
    PopFirst,
    Peek,
    Clear,
    ForEach(u8),
}

#[derive(arbitrary::Arbitrary, Debug)]
struct FuzzInput {
    capacity: u8,
    ops: Vec<Op>,
}

fuzz_target!(|data: FuzzInput| {
    let Some(capacity) = NonZeroUsize::new(usize::from(data.capacity)) else {
        return;
    };
    let mut fifo = RingFifo::new(capacity);
    let mut model = VecDeque::with_capacity(capacity.get());

    for op in data.ops {
        match op {
            Op::Push(v) => {
                let accepted = model.len() < capacity.get();
                if accepted {
                    model.push_back(v);
                }
                assert_eq!(fifo.push(&v), accepted);
            }
            Op::ForcedPush(v) => {
                let dropped = model.len() == capacity.get();
                if dropped {
                    model.pop_front();
                }
                model.push_back(v);
                assert_eq!(fifo.forced_push(&v), dropped);
            }
            Op::Pop => assert_eq!(fifo.pop(), model.pop_front().is_some()),
            Op::PopFirst => assert_eq!(fifo.pop_first(), model.pop_front()),
            Op::Peek => assert_eq!(fifo.peek_first(), model.front()),
            Op::Clear => {
                fifo.clear();
                model.clear();
            }
            Op::ForEach(stop_at) => {
                let mut seen = Vec::new();
                let visited = fifo.for_each(|item, index| {
                    assert_eq!(index, seen.len());
                    seen.push(*item);
                    index != usize::from(stop_at)
                });
                assert_eq!(visited, seen.len());
                let expected: Vec<u16> = model
                    .iter()
                    .copied()
                    .take(usize::from(stop_at) + 1)
                    .collect();
                assert_eq!(seen, expected);
            }
        }
        assert_eq!(fifo.len(), model.len());
        assert_eq!(fifo.is_empty(), model.is_empty());
        assert_eq!(fifo.is_full(), model.len() == capacity.get());
    }
});
