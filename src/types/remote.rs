//! GPIB remote enable (REN) line control.

/// How to drive the GPIB REN line and address the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenMode {
    /// Deassert REN.
    Deassert,
    /// Assert REN.
    Assert,
    /// Send Go To Local to the device, then deassert REN.
    DeassertGoToLocal,
    /// Assert REN and address the device.
    AssertAddress,
    /// Assert REN and send Local Lockout.
    AssertLocalLockout,
    /// Assert REN, address the device and send Local Lockout.
    AssertAddressLocalLockout,
    /// Address the device and send Go To Local.
    AddressGoToLocal,
}

impl RenMode {
    /// Returns true if the REN line is asserted after this operation.
    #[must_use]
    pub const fn asserts_line(self) -> bool {
        matches!(
            self,
            Self::Assert
                | Self::AssertAddress
                | Self::AssertLocalLockout
                | Self::AssertAddressLocalLockout
        )
    }

    /// Returns true if front panel control is locked out by this operation.
    #[must_use]
    pub const fn locks_out(self) -> bool {
        matches!(
            self,
            Self::AssertLocalLockout | Self::AssertAddressLocalLockout
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_state() {
        assert!(RenMode::Assert.asserts_line());
        assert!(RenMode::AssertAddressLocalLockout.asserts_line());
        assert!(!RenMode::Deassert.asserts_line());
        assert!(!RenMode::DeassertGoToLocal.asserts_line());
        assert!(!RenMode::AddressGoToLocal.asserts_line());
    }

    #[test]
    fn test_lockout() {
        assert!(RenMode::AssertLocalLockout.locks_out());
        assert!(RenMode::AssertAddressLocalLockout.locks_out());
        assert!(!RenMode::AssertAddress.locks_out());
        assert!(!RenMode::Deassert.locks_out());
    }
}
