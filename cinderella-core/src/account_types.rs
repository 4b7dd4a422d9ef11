use std::fmt;
use std::str::FromStr;

/// Allowed account types.
///
/// <https://docs.google.com/document/d/1wAMVrKIA2qtRGmoVDSUBJGmYZSygUaR0uOMW1GV3YE0/edit#heading=h.17ry42rqbuiu>
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum AccountType {
    Assets,
    Liabilities,
    Equity,
    Income,
    Expenses,
}

impl AccountType {
    pub const ALL: [AccountType; 5] = [
        AccountType::Assets,
        AccountType::Liabilities,
        AccountType::Equity,
        AccountType::Income,
        AccountType::Expenses,
    ];

    /// Root name used for this account type unless an `option "name_*"` renames it.
    pub fn default_name(self) -> &'static str {
        match self {
            AccountType::Assets => "Assets",
            AccountType::Liabilities => "Liabilities",
            AccountType::Equity => "Equity",
            AccountType::Income => "Income",
            AccountType::Expenses => "Expenses",
        }
    }

    /// Name of the option that renames this root, e.g. `name_assets`.
    pub fn option_name(self) -> &'static str {
        match self {
            AccountType::Assets => "name_assets",
            AccountType::Liabilities => "name_liabilities",
            AccountType::Equity => "name_equity",
            AccountType::Income => "name_income",
            AccountType::Expenses => "name_expenses",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_name())
    }
}

impl FromStr for AccountType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountType::ALL
            .iter()
            .copied()
            .find(|ty| ty.default_name() == s)
            .ok_or(())
    }
}
