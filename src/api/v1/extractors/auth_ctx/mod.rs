/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - Request Gate が解決した principal (AuthCtx) を handler に渡す
 * - role / 所有者チェックの helper を AuthCtx に持たせる
 *
 * Public API:
 * - AuthCtx
 * - AuthCtxExtractor
 */

mod core;
mod types;

pub use core::AuthCtxExtractor;
pub use types::AuthCtx;
