//! Two-buffer arena for passes that read one field and write another.
//!
//! `switcher` names the physical buffer the next pass writes. The other
//! buffer holds the most recent result and is what passes read. After a pass
//! writes, `swap()` makes its output the new front.

/// Double buffer with an explicit write index.
#[derive(Clone, Debug)]
pub struct PingPong<T> {
    buffers: [T; 2],
    switcher: usize,
}

impl<T> PingPong<T> {
    /// Wrap two same-shaped buffers. Buffer 1 starts as the front, so the
    /// first pass writes buffer 0.
    pub fn new(a: T, b: T) -> Self {
        Self {
            buffers: [a, b],
            switcher: 0,
        }
    }

    /// Physical index (0 or 1) of the write target.
    #[inline]
    pub fn index(&self) -> usize {
        self.switcher
    }

    /// Buffer holding the latest result.
    #[inline]
    pub fn front(&self) -> &T {
        &self.buffers[self.switcher ^ 1]
    }

    pub fn front_mut(&mut self) -> &mut T {
        &mut self.buffers[self.switcher ^ 1]
    }

    /// Buffer the next pass writes.
    #[inline]
    pub fn back(&self) -> &T {
        &self.buffers[self.switcher]
    }

    pub fn back_mut(&mut self) -> &mut T {
        &mut self.buffers[self.switcher]
    }

    /// Read the front and write the back in one borrow.
    pub fn split(&mut self) -> (&T, &mut T) {
        let (first, second) = self.buffers.split_at_mut(1);
        if self.switcher == 0 {
            (&second[0], &mut first[0])
        } else {
            (&first[0], &mut second[0])
        }
    }

    /// Make the last write the new front.
    #[inline]
    pub fn swap(&mut self) {
        self.switcher ^= 1;
    }

    /// Both buffers in physical order.
    pub fn buffers(&self) -> &[T; 2] {
        &self.buffers
    }
}

impl<T: Clone> PingPong<T> {
    /// Allocate both buffers from one prototype.
    pub fn from_prototype(prototype: T) -> Self {
        Self::new(prototype.clone(), prototype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_reads_front_writes_back() {
        let mut pp = PingPong::new(1, 2);
        assert_eq!(pp.index(), 0);
        assert_eq!(*pp.front(), 2);

        let (src, dst) = pp.split();
        *dst = *src * 10;
        pp.swap();

        assert_eq!(pp.index(), 1);
        assert_eq!(*pp.front(), 20, "the write becomes the front after swap");
        assert_eq!(*pp.back(), 2);
    }

    #[test]
    fn test_even_swaps_return_to_start() {
        let mut pp = PingPong::from_prototype(0u8);
        for _ in 0..6 {
            pp.swap();
        }
        assert_eq!(pp.index(), 0);
    }

    #[test]
    fn test_mut_access_follows_switcher() {
        let mut pp = PingPong::new(vec![0u8], vec![0u8]);
        pp.back_mut().push(1);
        pp.front_mut().push(2);
        assert_eq!(pp.buffers()[1], vec![0, 1]);
        assert_eq!(pp.buffers()[0], vec![0, 2]);
    }
}
