//! Authentication: token signing, password hashing, session cookies and the request guard

pub mod cookie;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use cookie::CookiePolicy;
pub use jwt::{Claims, JwtService, TokenError, TokenKind, TokenPair};
pub use middleware::{authenticate, extract_access_token, jwt_auth_middleware, AuthContext};
pub use password::PasswordHasher;
