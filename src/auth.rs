/// Bearer token for the platform's admin API. Never printed in logs.
pub struct BearerToken(String);

impl From<&str> for BearerToken {
    fn from(value: &str) -> Self {
        Self(value.trim().to_owned())
    }
}

impl BearerToken {
    /// Blank values from the environment count as no token.
    pub fn from_optional(value: Option<&str>) -> Option<Self> {
        value
            .map(Self::from)
            .filter(|token| !token.as_str().is_empty())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<redacted>")
    }
}
