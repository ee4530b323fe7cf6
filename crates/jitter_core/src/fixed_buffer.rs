use crate::CaptureError;
use core::mem::MaybeUninit;
use core::ops::Deref;
use core::slice;

/// A fixed-capacity, append-only buffer that lives in static memory.
///
/// Capacity is checked on every `push`; a full buffer reports
/// `BufferOverflow` instead of writing past its storage.
pub struct FixedBuffer<T: Copy, const N: usize> {
    data: [MaybeUninit<T>; N],
    len: usize,
}

impl<T: Copy, const N: usize> Default for FixedBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy, const N: usize> FixedBuffer<T, N> {
    pub const fn new() -> Self {
        Self {
            data: [const { MaybeUninit::uninit() }; N],
            len: 0,
        }
    }

    #[inline(always)]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    #[inline(always)]
    pub fn push(&mut self, item: T) -> Result<(), CaptureError> {
        let slot = self
            .data
            .get_mut(self.len)
            .ok_or(CaptureError::BufferOverflow)?;
        slot.write(item);
        self.len += 1;
        Ok(())
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[T] {
        unsafe {
            // Safety: data[0..len] is initialized.
            slice::from_raw_parts(self.data.as_ptr() as *const T, self.len)
        }
    }
}

impl<T: Copy, const N: usize> Deref for FixedBuffer<T, N> {
    type Target = [T];
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_stops_at_capacity() {
        let mut buf: FixedBuffer<u16, 3> = FixedBuffer::new();
        assert!(buf.is_empty());
        for v in [7, 8, 9] {
            buf.push(v).unwrap();
        }
        assert!(buf.is_full());
        assert_eq!(buf.push(10), Err(CaptureError::BufferOverflow));
        assert_eq!(buf.as_slice(), &[7, 8, 9]);
    }

    #[test]
    fn clear_reuses_storage() {
        let mut buf: FixedBuffer<u16, 2> = FixedBuffer::new();
        buf.push(1).unwrap();
        buf.push(2).unwrap();
        buf.clear();
        assert_eq!(buf.len(), 0);
        buf.push(3).unwrap();
        assert_eq!(&*buf, &[3]);
        assert_eq!(buf.capacity(), 2);
    }
}
