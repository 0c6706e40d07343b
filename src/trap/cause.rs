//! Classification of the `scause` CSR value into the async/sync trap kinds
//! the dispatcher acts on. Kept separate from CSR access so it is testable
//! on the host.

const ASYNC_FLAG: usize = 1 << (usize::BITS - 1);

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Trap {
    SoftwareInterrupt,
    TimerInterrupt,
    ExternalInterrupt,
    UnknownInterrupt(usize),
    EnvironmentCall,
    IllegalInstruction,
    LoadFault,
    StoreFault,
    UnknownException(usize),
}

/// Decode a raw `scause` value into a `Trap`. Mirrors the cause-code
/// dispatch table of a supervisor-mode trap handler: bit 1<<(XLEN-1) marks
/// an asynchronous trap (interrupt), the remaining bits are the code.
pub fn classify(scause: usize) -> Trap {
    let code = scause & !ASYNC_FLAG;
    if scause & ASYNC_FLAG != 0 {
        match code {
            1 => Trap::SoftwareInterrupt,
            5 => Trap::TimerInterrupt,
            9 => Trap::ExternalInterrupt,
            other => Trap::UnknownInterrupt(other),
        }
    } else {
        match code {
            2 => Trap::IllegalInstruction,
            5 => Trap::LoadFault,
            7 => Trap::StoreFault,
            8 | 11 => Trap::EnvironmentCall,
            other => Trap::UnknownException(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_async_traps() {
        assert_eq!(classify(ASYNC_FLAG | 1), Trap::SoftwareInterrupt);
        assert_eq!(classify(ASYNC_FLAG | 5), Trap::TimerInterrupt);
        assert_eq!(classify(ASYNC_FLAG | 9), Trap::ExternalInterrupt);
        assert_eq!(classify(ASYNC_FLAG | 42), Trap::UnknownInterrupt(42));
    }

    #[test]
    fn decodes_sync_traps() {
        assert_eq!(classify(2), Trap::IllegalInstruction);
        assert_eq!(classify(8), Trap::EnvironmentCall);
        assert_eq!(classify(11), Trap::EnvironmentCall);
        assert_eq!(classify(5), Trap::LoadFault);
        assert_eq!(classify(7), Trap::StoreFault);
        assert_eq!(classify(99), Trap::UnknownException(99));
    }
}
