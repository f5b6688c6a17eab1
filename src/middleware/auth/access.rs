//! Request Gate: bearer token 検証 → principal 解決 → AuthCtx を extensions に入れる
//!
//! 1 リクエストにつき 1 回だけ通る。順序:
//! 1. 公開ルートなら token を見ずに通す
//! 2. `Authorization: Bearer <token>` が無ければ未認証のまま通す (401 は identity を要求する handler 側)
//! 3. AuthCtx が既にあれば何もしない (二重適用でも lookup しない)
//! 4. 署名/形式エラーはその場で 401
//! 5. 期限切れ・subject 空も 401
//! 6. principal を引き直す。無い/inactive なら 401、あれば AuthCtx を付けて次へ
//!
//! token 失敗の理由は body では区別しない (log のみ)。

use axum::{
    Router,
    body::Body,
    extract::{OriginalUri, State},
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::middleware::failure;
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Router 全体に Request Gate を掛ける。
///
/// 例：
/// ```ignore
/// let router = api::v1::routes().merge(health);
/// let router = middleware::auth::access::apply(router, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    OriginalUri(original_uri): OriginalUri,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let path = original_uri.path();

    if state.public_routes.is_public(req.method(), path) {
        return next.run(req).await;
    }

    let Some(token) = bearer_token(req.headers()) else {
        return next.run(req).await;
    };

    if req.extensions().get::<AuthCtx>().is_some() {
        return next.run(req).await;
    }

    let codec = state.auth.codec();

    let subject = match codec.extract_subject(&token) {
        Ok(sub) => sub,
        Err(err) => {
            tracing::warn!(error = %err, "bearer token rejected");
            return failure::unauthenticated(path);
        }
    };

    if !codec.verify(&token) || subject.trim().is_empty() {
        tracing::warn!(sub = %subject, "bearer token expired or without subject");
        return failure::unauthenticated(path);
    }

    let principal = match state.auth.directory().find_active_by_username(&subject).await {
        Ok(Some(p)) => p,
        Ok(None) => {
            tracing::warn!(sub = %subject, "token subject is unknown or inactive");
            return failure::unauthenticated(path);
        }
        Err(err) => {
            tracing::error!(error = ?err, "principal lookup failed");
            return AppError::Internal.into_response();
        }
    };

    tracing::debug!(user_id = principal.id, role = %principal.role, "request authenticated");

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(AuthCtx::new(principal));

    next.run(req).await
}

/// `Bearer <token>` の token 部分 (trim 済み)。形が違えば None。
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = raw.strip_prefix(BEARER_PREFIX)?.trim();
    (!token.is_empty()).then(|| token.to_string())
}
