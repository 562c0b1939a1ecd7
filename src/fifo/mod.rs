mod char_fifo;
mod ring;

pub use char_fifo::CharFifo;
pub use ring::{Consumer, Producer, RingFifo};
