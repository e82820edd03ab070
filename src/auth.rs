//! Credential hashing, HS256 bearer tokens and caller resolution.
//!
//! Tokens are JWTs signed with HMAC-SHA256. Admin tokens carry an `email` claim; hero
//! tokens carry `role: "hero"` and the hero alias. Resolution checks the signature and
//! expiry first, then confirms the subject still exists in storage.
use crate::error::{AuthError, ServiceError, StorageError};
use crate::hero::Hero;
use crate::storage::{Record, Store};
use crate::types::{CallerIdentity, TimeStamp};
use crate::utils::{ADMIN_PREFIX, new_record_id};
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

pub const HERO_ROLE: &str = "hero";

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct Admin {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub email: String,
    #[n(2)]
    pub credential_hash: String,
    #[n(3)]
    pub created_at: TimeStamp<Utc>,
}

impl Record for Admin {
    const TREE: &'static str = "admins";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub token: String,
}

/// bcrypt hash with an embedded salt and cost.
pub fn hash_credential(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|err| {
        error!(error = %err, "credential hashing failed");
        AuthError::Hashing
    })
}

/// A malformed stored hash verifies as a mismatch.
pub fn verify_credential(password: &str, stored: &str) -> bool {
    bcrypt::verify(password, stored).unwrap_or(false)
}

/// Signs and verifies HS256 tokens.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    /// Sign claims issued at `now` (unix seconds).
    pub fn sign_at(
        &self,
        id: &str,
        email: Option<&str>,
        alias: Option<&str>,
        role: Option<&str>,
        now: i64,
    ) -> Result<String, AuthError> {
        let exp = now.checked_add(self.ttl_secs).ok_or_else(|| {
            error!(ttl = self.ttl_secs, "token expiry out of range");
            AuthError::Signing
        })?;
        let claims = Claims {
            id: id.to_string(),
            email: email.map(str::to_string),
            alias: alias.map(str::to_string),
            role: role.map(str::to_string),
            iat: now,
            exp,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(
            |err| {
                error!(error = %err, "token signing failed");
                AuthError::Signing
            },
        )
    }

    /// Check algorithm, signature and expiry against the current clock.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        jsonwebtoken::decode::<Claims>(token.trim(), &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken,
            })
    }
}

/// Extract the token from an `Authorization` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingToken)?;
    match header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::MalformedHeader),
    }
}

#[derive(Clone)]
pub struct AuthService {
    store: Store,
    signer: TokenSigner,
}

impl AuthService {
    pub fn new(store: Store, signer: TokenSigner) -> Self {
        Self { store, signer }
    }

    fn now() -> i64 {
        Utc::now().timestamp()
    }

    pub fn issue_admin_token(&self, admin: &Admin) -> Result<Token, AuthError> {
        let token = self
            .signer
            .sign_at(&admin.id, Some(&admin.email), None, None, Self::now())?;
        Ok(Token { token })
    }

    pub fn issue_hero_token(&self, hero: &Hero) -> Result<Token, AuthError> {
        let token =
            self.signer
                .sign_at(&hero.id, None, Some(&hero.alias), Some(HERO_ROLE), Self::now())?;
        Ok(Token { token })
    }

    /// Create the admin account unless one with this email already exists.
    pub fn ensure_admin(&self, email: &str, password: &str) -> Result<Admin, ServiceError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ServiceError::invalid("email", "email is required"));
        }
        if password.is_empty() {
            return Err(ServiceError::invalid("password", "password is required"));
        }
        if let Some(existing) = self.find_admin(email)? {
            return Ok(existing);
        }

        let admin = Admin {
            id: new_record_id(ADMIN_PREFIX).map_err(|e| StorageError::Id(e.to_string()))?,
            email: email.to_string(),
            credential_hash: hash_credential(password)?,
            created_at: TimeStamp::new(),
        };
        self.store.admins().save(&admin)?;
        info!(admin = %admin.id, email = %admin.email, "admin account created");
        Ok(admin)
    }

    fn find_admin(&self, email: &str) -> Result<Option<Admin>, StorageError> {
        Ok(self
            .store
            .admins()
            .find(|a| a.email == email)?
            .into_iter()
            .next())
    }

    pub fn login_admin(&self, email: &str, password: &str) -> Result<Token, ServiceError> {
        let admin = self
            .find_admin(email.trim())?
            .filter(|a| verify_credential(password, &a.credential_hash));

        match admin {
            Some(admin) => {
                info!(admin = %admin.id, "admin logged in");
                Ok(self.issue_admin_token(&admin)?)
            }
            None => {
                warn!("admin login rejected");
                Err(AuthError::InvalidCredentials.into())
            }
        }
    }

    pub fn login_hero(&self, alias: &str, password: &str) -> Result<Token, ServiceError> {
        let alias = alias.trim();
        let hero = self
            .store
            .heroes()
            .find(|h| h.alias == alias)?
            .into_iter()
            .find(|h| {
                h.credential_hash
                    .as_deref()
                    .is_some_and(|hash| verify_credential(password, hash))
            });

        match hero {
            Some(hero) => {
                info!(hero = %hero.id, "hero logged in");
                Ok(self.issue_hero_token(&hero)?)
            }
            None => {
                warn!(alias, "hero login rejected");
                Err(AuthError::InvalidCredentials.into())
            }
        }
    }

    /// Signature and expiry only, no storage lookup.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.signer.verify(token)
    }

    /// Resolve a token to a caller whose account still exists.
    pub fn resolve(&self, token: &str) -> Result<CallerIdentity, ServiceError> {
        let claims = self.verify(token)?;

        if claims.email.is_some() {
            return match self.store.admins().get(&claims.id)? {
                Some(admin) => Ok(CallerIdentity::admin(admin.id)),
                None => Err(AuthError::UnknownSubject.into()),
            };
        }
        if claims.role.as_deref() == Some(HERO_ROLE) {
            return match self.store.heroes().get(&claims.id)? {
                Some(hero) => Ok(CallerIdentity::hero(hero.id)),
                None => Err(AuthError::UnknownSubject.into()),
            };
        }
        Err(AuthError::UnsupportedToken.into())
    }

    pub fn resolve_header(&self, header: Option<&str>) -> Result<CallerIdentity, ServiceError> {
        let token = bearer_token(header)?;
        self.resolve(token)
    }
}
