use core::{
    fmt,
    ops::{BitAnd, BitOr, BitOrAssign},
};

use alloy_primitives::U256;

/// Version of the bit-position table below.
///
/// Capabilities are append-only: a new capability takes the next free bit and bumps this
/// version. Existing positions are never reused or shifted.
pub const PERMISSION_TABLE_VERSION: u16 = 1;

/// Every capability except `REENTRANCY`, `SUPER_DELEGATECALL` and `DELEGATECALL`.
pub const ALL_PERMISSIONS: Permissions = Permissions(U256::from_limbs([0x007f_3f7f, 0, 0, 0]));

/// One named capability. The discriminant is the bit position in the 256-bit mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Permission {
    ChangeOwner = 0,
    AddController = 1,
    EditPermissions = 2,
    AddExtensions = 3,
    ChangeExtensions = 4,
    AddUniversalReceiverDelegate = 5,
    ChangeUniversalReceiverDelegate = 6,
    Reentrancy = 7,

    SuperTransferValue = 8,
    TransferValue = 9,
    SuperCall = 10,
    Call = 11,
    SuperStaticCall = 12,
    StaticCall = 13,
    SuperDelegateCall = 14,
    DelegateCall = 15,
    Deploy = 16,

    SuperSetData = 17,
    SetData = 18,
    Encrypt = 19,
    Decrypt = 20,
    Sign = 21,
    ExecuteRelayCall = 22,
}

impl Permission {
    /// All capabilities in bit order.
    pub const ALL: [Permission; 23] = [
        Permission::ChangeOwner,
        Permission::AddController,
        Permission::EditPermissions,
        Permission::AddExtensions,
        Permission::ChangeExtensions,
        Permission::AddUniversalReceiverDelegate,
        Permission::ChangeUniversalReceiverDelegate,
        Permission::Reentrancy,
        Permission::SuperTransferValue,
        Permission::TransferValue,
        Permission::SuperCall,
        Permission::Call,
        Permission::SuperStaticCall,
        Permission::StaticCall,
        Permission::SuperDelegateCall,
        Permission::DelegateCall,
        Permission::Deploy,
        Permission::SuperSetData,
        Permission::SetData,
        Permission::Encrypt,
        Permission::Decrypt,
        Permission::Sign,
        Permission::ExecuteRelayCall,
    ];

    pub const fn bit(self) -> u8 {
        self as u8
    }

    /// Canonical upper-case name, as used in `NotAuthorised(address,string)` reverts.
    pub const fn name(self) -> &'static str {
        match self {
            Permission::ChangeOwner => "CHANGEOWNER",
            Permission::AddController => "ADDCONTROLLER",
            Permission::EditPermissions => "EDITPERMISSIONS",
            Permission::AddExtensions => "ADDEXTENSIONS",
            Permission::ChangeExtensions => "CHANGEEXTENSIONS",
            Permission::AddUniversalReceiverDelegate => "ADDUNIVERSALRECEIVERDELEGATE",
            Permission::ChangeUniversalReceiverDelegate => "CHANGEUNIVERSALRECEIVERDELEGATE",
            Permission::Reentrancy => "REENTRANCY",
            Permission::SuperTransferValue => "SUPER_TRANSFERVALUE",
            Permission::TransferValue => "TRANSFERVALUE",
            Permission::SuperCall => "SUPER_CALL",
            Permission::Call => "CALL",
            Permission::SuperStaticCall => "SUPER_STATICCALL",
            Permission::StaticCall => "STATICCALL",
            Permission::SuperDelegateCall => "SUPER_DELEGATECALL",
            Permission::DelegateCall => "DELEGATECALL",
            Permission::Deploy => "DEPLOY",
            Permission::SuperSetData => "SUPER_SETDATA",
            Permission::SetData => "SETDATA",
            Permission::Encrypt => "ENCRYPT",
            Permission::Decrypt => "DECRYPT",
            Permission::Sign => "SIGN",
            Permission::ExecuteRelayCall => "EXECUTE_RELAY_CALL",
        }
    }

    /// The SUPER variant that bypasses the allow-list for this capability, if any.
    pub const fn super_variant(self) -> Option<Permission> {
        match self {
            Permission::TransferValue => Some(Permission::SuperTransferValue),
            Permission::Call => Some(Permission::SuperCall),
            Permission::StaticCall => Some(Permission::SuperStaticCall),
            Permission::DelegateCall => Some(Permission::SuperDelegateCall),
            Permission::SetData => Some(Permission::SuperSetData),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Permission {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Permission::ALL.get(value as usize).copied().ok_or(())
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A controller's capability bitmask.
///
/// A set bit is necessary but not sufficient: allow-lists may still restrict a capability
/// whose SUPER variant is not held.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Permissions(U256);

impl Permissions {
    pub const NONE: Permissions = Permissions(U256::ZERO);

    pub const fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    pub const fn into_raw(self) -> U256 {
        self.0
    }

    /// Decode a stored permission value. Anything other than a 32-byte word reads as no
    /// permissions.
    pub fn from_word(value: &[u8]) -> Self {
        if value.len() != 32 {
            return Self::NONE;
        }
        Self(U256::from_be_slice(value))
    }

    pub fn to_word(self) -> [u8; 32] {
        self.0.to_be_bytes::<32>()
    }

    pub fn is_empty(self) -> bool {
        self.0.is_zero()
    }

    pub fn has(self, permission: Permission) -> bool {
        self.0.bit(permission.bit() as usize)
    }

    /// True if at least one bit of `set` is held.
    pub fn has_any(self, set: Permissions) -> bool {
        !(self.0 & set.0).is_zero()
    }

    /// True if every bit of `set` is held.
    pub fn contains(self, set: Permissions) -> bool {
        (self.0 & set.0) == set.0
    }

    /// Bitwise OR. Configuration-time only; checks use `has`/`has_any`.
    pub fn combine(self, permission: Permission) -> Self {
        self.union(permission.into())
    }

    pub fn union(self, other: Permissions) -> Self {
        Self(self.0 | other.0)
    }

    pub fn difference(self, other: Permissions) -> Self {
        Self(self.0 & !other.0)
    }

    /// Known capabilities held, in bit order. Unknown high bits are ignored.
    pub fn iter(self) -> impl Iterator<Item = Permission> {
        Permission::ALL.into_iter().filter(move |p| self.has(*p))
    }
}

impl From<Permission> for Permissions {
    fn from(permission: Permission) -> Self {
        Self(U256::from(1u8) << (permission.bit() as usize))
    }
}

impl FromIterator<Permission> for Permissions {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, Permissions::combine)
    }
}

impl BitOr for Permissions {
    type Output = Permissions;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl BitOr<Permission> for Permissions {
    type Output = Permissions;

    fn bitor(self, rhs: Permission) -> Self::Output {
        self.combine(rhs)
    }
}

impl BitOrAssign<Permission> for Permissions {
    fn bitor_assign(&mut self, rhs: Permission) {
        *self = self.combine(rhs);
    }
}

impl BitAnd for Permissions {
    type Output = Permissions;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}
