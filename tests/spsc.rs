//! Producer and consumer on separate threads.

#![cfg(feature = "fifo")]

use std::io::{Read as _, Write as _};
use std::mem::MaybeUninit;
use std::num::NonZeroUsize;
use std::sync::Once;
use std::thread;

use libutils::fifo::{CharFifo, RingFifo};

const ITEMS: usize = 4096;
const CAPACITY: usize = 10;

static INIT: Once = Once::new();

fn init_logger() {
    INIT.call_once(|| {
        let _ = pretty_env_logger::try_init();
    });
}

fn run_ordered_transfer(fifo: &mut RingFifo<'_, usize>) {
    let (mut producer, mut consumer) = fifo.split();

    thread::scope(|s| {
        s.spawn(move || {
            for i in 0..ITEMS {
                while !producer.push(&i) {
                    thread::yield_now();
                }
            }
        });

        s.spawn(move || {
            let mut expected = 0;
            while expected < ITEMS {
                match consumer.pop_first() {
                    Some(item) => {
                        assert_eq!(item, expected, "items arrived out of order");
                        expected += 1;
                    }
                    None => thread::yield_now(),
                }
            }
        });
    });

    assert!(fifo.is_empty());
    assert_eq!(fifo.len(), 0);
}

#[test]
fn test_spsc_ordered_owned() {
    init_logger();
    let mut fifo = RingFifo::new(NonZeroUsize::new(CAPACITY).unwrap());
    run_ordered_transfer(&mut fifo);
}

#[test]
fn test_spsc_ordered_borrowed() {
    init_logger();
    let mut backing = [const { MaybeUninit::uninit() }; CAPACITY];
    let mut fifo = RingFifo::with_buffer(&mut backing).unwrap();
    run_ordered_transfer(&mut fifo);
}

#[test]
fn test_spsc_peek_matches_pop() {
    init_logger();
    let mut fifo = RingFifo::new(NonZeroUsize::new(CAPACITY).unwrap());
    let (mut producer, mut consumer) = fifo.split();

    thread::scope(|s| {
        s.spawn(move || {
            for i in 0..ITEMS as u64 {
                while !producer.push(&i) {
                    thread::yield_now();
                }
            }
        });

        s.spawn(move || {
            let mut expected = 0u64;
            while expected < ITEMS as u64 {
                let Some(&head) = consumer.peek_first() else {
                    thread::yield_now();
                    continue;
                };
                assert_eq!(head, expected);
                assert!(consumer.len() <= CAPACITY);
                assert_eq!(consumer.get_and_pop(), expected);
                expected += 1;
            }
        });
    });
}

#[test]
fn test_spsc_byte_stream() {
    init_logger();
    let payload: Vec<u8> = (0..ITEMS).map(|i| (i * 7) as u8).collect();
    let mut backing = [MaybeUninit::uninit(); CAPACITY];
    let mut fifo = CharFifo::with_buffer(&mut backing).unwrap();
    let (mut producer, mut consumer) = fifo.split();

    let received = thread::scope(|s| {
        let payload = &payload;
        s.spawn(move || {
            let mut rest = &payload[..];
            while !rest.is_empty() {
                let written = producer.write(rest).unwrap();
                rest = &rest[written..];
                if written == 0 {
                    thread::yield_now();
                }
            }
        });

        s.spawn(move || {
            let mut received = Vec::with_capacity(ITEMS);
            let mut chunk = [0u8; 3];
            while received.len() < ITEMS {
                let read = consumer.read(&mut chunk).unwrap();
                received.extend_from_slice(&chunk[..read]);
                if read == 0 {
                    thread::yield_now();
                }
            }
            received
        })
        .join()
        .unwrap()
    });

    assert_eq!(received, payload);
    assert!(fifo.is_empty());
}
