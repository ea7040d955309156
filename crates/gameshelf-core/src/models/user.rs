use serde::{Deserialize, Serialize};

use crate::api::ApiError;
use crate::auth::Identity;

/// A platform account as returned by the user endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl User {
    pub fn role(&self) -> &'static str {
        if self.is_admin {
            "Admin"
        } else {
            "User"
        }
    }

    pub fn to_identity(&self) -> Identity {
        Identity::new(&self.id, &self.name, &self.email, self.is_admin)
    }
}

/// Response of `POST /users/login`: the identity fields plus the token
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
    pub token: String,
}

impl LoginResponse {
    /// Split into the identity and the token.
    ///
    /// A blank id or token could not be restored later, so it is rejected.
    pub fn into_parts(self) -> Result<(Identity, String), ApiError> {
        if self.id.trim().is_empty() || self.token.trim().is_empty() {
            return Err(ApiError::InvalidResponse(
                "login response without user id or token".to_string(),
            ));
        }
        let identity = Identity {
            id: self.id,
            name: self.name,
            email: self.email,
            is_admin: self.is_admin,
        };
        Ok((identity, self.token))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: String,
}

/// Body for `PUT /users/profile`; the password is only sent when changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Body for the admin `PUT /users/:id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserUpdate {
    pub name: String,
    pub email: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_into_parts() {
        let response: LoginResponse = serde_json::from_str(
            r#"{"_id": "1", "name": "Ann", "email": "a@x.com", "isAdmin": true, "token": "tok"}"#,
        )
        .unwrap();
        let (identity, token) = response.into_parts().unwrap();
        assert_eq!(identity, Identity::new("1", "Ann", "a@x.com", true));
        assert_eq!(token, "tok");
    }

    #[test]
    fn test_login_response_blank_token_or_id_rejected() {
        for json in [
            r#"{"_id": "1", "name": "Ann", "email": "a@x.com", "token": ""}"#,
            r#"{"_id": "", "name": "Ann", "email": "a@x.com", "token": "tok"}"#,
        ] {
            let response: LoginResponse = serde_json::from_str(json).unwrap();
            let err = response.into_parts().unwrap_err();
            assert!(matches!(err, ApiError::InvalidResponse(_)));
            assert_eq!(
                err.user_message(),
                "Received an unexpected response format from the server."
            );
        }
    }

    #[test]
    fn test_login_response_requires_token() {
        let result: Result<LoginResponse, _> =
            serde_json::from_str(r#"{"_id": "1", "name": "Ann", "email": "a@x.com"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_profile_update_omits_empty_password() {
        let body = ProfileUpdate {
            name: "Ann".to_string(),
            email: "a@x.com".to_string(),
            password: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("password").is_none());
    }

    #[test]
    fn test_user_role() {
        let user: User =
            serde_json::from_str(r#"{"_id": "2", "name": "Bo", "email": "b@x.com"}"#).unwrap();
        assert_eq!(user.role(), "User");
        assert!(!user.to_identity().is_admin);
    }
}
