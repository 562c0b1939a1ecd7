use std::io;

use crate::fifo::{Consumer, Producer, RingFifo};

/// A FIFO of raw bytes, e.g. characters waiting on a serial line.
///
/// Byte FIFOs also implement [`io::Write`] (push until full) and
/// [`io::Read`] (pop until empty), as do their split halves.
pub type CharFifo<'a> = RingFifo<'a, u8>;

fn push_bytes(buf: &[u8], mut push: impl FnMut(&u8) -> bool) -> usize {
    buf.iter().take_while(|&byte| push(byte)).count()
}

fn pop_bytes(buf: &mut [u8], mut pop: impl FnMut() -> Option<u8>) -> usize {
    let mut read = 0;
    for slot in buf {
        match pop() {
            Some(byte) => *slot = byte,
            None => break,
        }
        read += 1;
    }
    read
}

impl io::Write for RingFifo<'_, u8> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(push_bytes(buf, |byte| self.push(byte)))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Read for RingFifo<'_, u8> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(pop_bytes(buf, || self.pop_first()))
    }
}

impl io::Write for Producer<'_, '_, u8> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(push_bytes(buf, |byte| self.push(byte)))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Read for Consumer<'_, '_, u8> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(pop_bytes(buf, || self.pop_first()))
    }
}
