//! Seller identity printed on every document and sent to backends.

/// Fixed identity block for the issuing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompanyInfo {
    pub name: &'static str,
    pub address: &'static str,
    pub postal_code: &'static str,
    pub city: &'static str,
    pub phone: &'static str,
    pub email: &'static str,
    pub siret: &'static str,
    pub website: &'static str,
}

impl CompanyInfo {
    /// MYCONFORT store identity.
    pub const MYCONFORT: CompanyInfo = CompanyInfo {
        name: "MYCONFORT",
        address: "88 avenue des Ternes",
        postal_code: "75017",
        city: "Paris",
        phone: "04 68 50 41 45",
        email: "myconfort66@gmail.com",
        siret: "824 313 530 00027",
        website: "https://www.htconfort.com",
    };

    /// Single-line postal address.
    pub fn address_line(&self) -> String {
        format!("{}, {} {}", self.address, self.postal_code, self.city)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_line() {
        let company = CompanyInfo::MYCONFORT;
        assert_eq!(
            company.address_line(),
            "88 avenue des Ternes, 75017 Paris"
        );
    }
}
