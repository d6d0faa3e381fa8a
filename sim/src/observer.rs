//! Fault delivery to the host.

use arm_model::{FaultKind, MotionFault};

/// Receives each fault once, on the tick or submission that raised it.
pub trait FaultObserver {
    fn on_fault(&mut self, fault: &MotionFault);
}

impl<F> FaultObserver for F
where
    F: FnMut(&MotionFault),
{
    fn on_fault(&mut self, fault: &MotionFault) {
        self(fault)
    }
}

/// Discards faults.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl FaultObserver for NoopObserver {
    fn on_fault(&mut self, _fault: &MotionFault) {}
}

/// Records faults in arrival order.
#[derive(Debug, Default, Clone)]
pub struct FaultLog {
    faults: Vec<MotionFault>,
}

impl FaultLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn faults(&self) -> &[MotionFault] {
        &self.faults
    }

    pub fn last(&self) -> Option<&MotionFault> {
        self.faults.last()
    }

    pub fn count(&self, kind: FaultKind) -> usize {
        self.faults.iter().filter(|fault| fault.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.faults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }

    pub fn clear(&mut self) {
        self.faults.clear();
    }
}

impl FaultObserver for FaultLog {
    fn on_fault(&mut self, fault: &MotionFault) {
        self.faults.push(*fault);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arm_model::{Pose, Speed, Target};

    fn fault(kind: FaultKind) -> MotionFault {
        MotionFault::new(kind, Target::linear(Pose::from_position(2.0, 0.0, 0.0), Speed::FULL))
    }

    #[test]
    fn test_fault_log_counts() {
        let mut log = FaultLog::new();
        log.on_fault(&fault(FaultKind::Unreachable));
        log.on_fault(&fault(FaultKind::LargeJump));
        log.on_fault(&fault(FaultKind::LargeJump));

        assert_eq!(log.len(), 3);
        assert_eq!(log.count(FaultKind::LargeJump), 2);
        assert_eq!(log.count(FaultKind::NoSolution), 0);
        assert_eq!(log.last().map(|f| f.kind), Some(FaultKind::LargeJump));
    }

    #[test]
    fn test_closure_observer() {
        let mut codes = Vec::new();
        {
            let mut observer = |fault: &MotionFault| codes.push(fault.kind.code());
            observer.on_fault(&fault(FaultKind::NoSolution));
        }
        assert_eq!(codes, vec![101]);
    }
}
