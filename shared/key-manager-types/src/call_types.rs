use core::ops::BitOr;

/// Call-type bits stored in the first 4 bytes of an allowed-call entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CallTypes(u32);

impl CallTypes {
    pub const NONE: CallTypes = CallTypes(0);
    pub const VALUE: CallTypes = CallTypes(0x1);
    pub const CALL: CallTypes = CallTypes(0x2);
    pub const STATICCALL: CallTypes = CallTypes(0x4);
    pub const DELEGATECALL: CallTypes = CallTypes(0x8);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub fn from_be_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_be_bytes(bytes))
    }

    pub fn to_be_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    /// Every bit of `required` is present.
    pub const fn covers(self, required: CallTypes) -> bool {
        self.0 & required.0 == required.0
    }
}

impl BitOr for CallTypes {
    type Output = CallTypes;

    fn bitor(self, rhs: Self) -> Self::Output {
        CallTypes(self.0 | rhs.0)
    }
}

/// ERC725X operation types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OperationType {
    Call = 0,
    Create = 1,
    Create2 = 2,
    StaticCall = 3,
    DelegateCall = 4,
}

impl OperationType {
    pub const fn is_create(self) -> bool {
        matches!(self, OperationType::Create | OperationType::Create2)
    }
}

impl TryFrom<u8> for OperationType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use OperationType::*;
        let op = match value {
            0 => Call,
            1 => Create,
            2 => Create2,
            3 => StaticCall,
            4 => DelegateCall,
            _ => return Err(()),
        };
        Ok(op)
    }
}
