use serde::Serialize;
use std::collections::HashMap;
use std::net::IpAddr;

/// Request information for authentication. Header names are lowercase.
#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub headers: HashMap<String, String>,
    pub source_ip: IpAddr,
}

impl AuthRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Who triggered a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub id: String,
    pub method: &'static str,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self {
            id: "anonymous".to_string(),
            method: "none",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_caller() {
        let caller = Caller::anonymous();
        assert_eq!(caller.id, "anonymous");
        assert_eq!(caller.method, "none");
    }

    #[test]
    fn test_header_lookup() {
        let request = AuthRequest {
            headers: HashMap::from([("x-cron-secret".to_string(), "abc".to_string())]),
            source_ip: "127.0.0.1".parse().unwrap(),
        };
        assert_eq!(request.header("x-cron-secret"), Some("abc"));
        assert_eq!(request.header("authorization"), None);
    }
}
