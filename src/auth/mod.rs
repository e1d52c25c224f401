// ==========================================
// 港口到港舱单系统 - 认证
// ==========================================
// token: 签名令牌（HS256），携带用户 id 与角色
// password: 口令加盐摘要
// ==========================================

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password};
pub use token::{AuthError, Claims, TokenService};
