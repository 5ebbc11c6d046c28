//! Register representation for a Hexagon-class VLIW core.

/// Register class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RegisterClass {
    /// General purpose register (r0-r31).
    General,
    /// Predicate register (p0-p3).
    Predicate,
    /// Control register (sa0, lc0, m0, usr, pc, ...).
    Control,
}

/// A single architectural register, identified by class and numeric ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Register {
    /// The class of register.
    pub class: RegisterClass,
    /// Register ID within its class.
    pub id: u16,
}

/// Control register IDs.
pub mod control {
    pub const SA0: u16 = 0;
    pub const LC0: u16 = 1;
    pub const SA1: u16 = 2;
    pub const LC1: u16 = 3;
    pub const P3_0: u16 = 4;
    pub const M0: u16 = 6;
    pub const M1: u16 = 7;
    pub const USR: u16 = 8;
    pub const PC: u16 = 9;
    pub const UGP: u16 = 10;
    pub const GP: u16 = 11;
    pub const CS0: u16 = 12;
    pub const CS1: u16 = 13;
}

impl Register {
    /// Creates a new register.
    pub fn new(class: RegisterClass, id: u16) -> Self {
        Self { class, id }
    }

    /// Creates a general purpose register (r0-r31).
    pub fn gpr(id: u16) -> Self {
        debug_assert!(id < 32);
        Self::new(RegisterClass::General, id)
    }

    /// Creates a predicate register (p0-p3).
    pub fn predicate(id: u16) -> Self {
        debug_assert!(id < 4);
        Self::new(RegisterClass::Predicate, id)
    }

    /// Creates a control register.
    pub fn control(id: u16) -> Self {
        Self::new(RegisterClass::Control, id)
    }

    /// The stack pointer alias (r29).
    pub fn sp() -> Self {
        Self::gpr(29)
    }

    /// The frame pointer alias (r30).
    pub fn fp() -> Self {
        Self::gpr(30)
    }

    /// The link register alias (r31).
    pub fn lr() -> Self {
        Self::gpr(31)
    }

    /// Returns the canonical name for this register.
    pub fn name(&self) -> String {
        match self.class {
            RegisterClass::General => format!("r{}", self.id),
            RegisterClass::Predicate => format!("p{}", self.id),
            RegisterClass::Control => match self.id {
                control::SA0 => "sa0".into(),
                control::LC0 => "lc0".into(),
                control::SA1 => "sa1".into(),
                control::LC1 => "lc1".into(),
                control::P3_0 => "p3:0".into(),
                control::M0 => "m0".into(),
                control::M1 => "m1".into(),
                control::USR => "usr".into(),
                control::PC => "pc".into(),
                control::UGP => "ugp".into(),
                control::GP => "gp".into(),
                control::CS0 => "cs0".into(),
                control::CS1 => "cs1".into(),
                id => format!("c{}", id),
            },
        }
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
