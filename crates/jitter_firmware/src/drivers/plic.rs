//! PLIC access for hart 0, machine mode (context 0).

use jitter_common::mmio::PLIC_BASE;

const PRIORITY: usize = PLIC_BASE;
const ENABLE: usize = PLIC_BASE + 0x2000;
const THRESHOLD: usize = PLIC_BASE + 0x20_0000;
const CLAIM_COMPLETE: usize = PLIC_BASE + 0x20_0004;

/// Routes `irq` to hart 0 with priority 1 and opens the threshold.
pub fn enable(irq: u32) {
    unsafe {
        ((PRIORITY + 4 * irq as usize) as *mut u32).write_volatile(1);
        let word = (ENABLE + 4 * (irq as usize / 32)) as *mut u32;
        word.write_volatile(word.read_volatile() | (1 << (irq % 32)));
        (THRESHOLD as *mut u32).write_volatile(0);
    }
}

/// Claims the highest-priority pending interrupt, if any.
#[inline(always)]
pub fn claim() -> Option<u32> {
    let irq = unsafe { (CLAIM_COMPLETE as *const u32).read_volatile() };
    (irq != 0).then_some(irq)
}

/// Signals that handling of a claimed interrupt has finished.
#[inline(always)]
pub fn complete(irq: u32) {
    unsafe { (CLAIM_COMPLETE as *mut u32).write_volatile(irq) }
}
