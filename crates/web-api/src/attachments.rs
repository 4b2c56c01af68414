//! 附件访问
//!
//! 校验预签名链接后返回对象内容。光栅图片按原类型内联返回，
//! 其他内容一律作为二进制附件下载，并禁止浏览器嗅探类型。

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use domain::{inline_image_type, OPAQUE_CONTENT_TYPE};
use serde::Deserialize;
use tracing::debug;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    pub expires: Option<i64>,
    pub signature: Option<String>,
}

pub async fn fetch_attachment(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<SignedQuery>,
) -> Result<Response, ApiError> {
    let (Some(expires), Some(signature)) = (query.expires, query.signature) else {
        return Err(ApiError::forbidden("missing signature"));
    };

    state
        .attachments
        .signer()
        .verify(&key, expires, &signature, Utc::now())
        .map_err(|err| {
            debug!(key = %key, error = %err, "附件链接校验失败");
            ApiError::forbidden(err.to_string())
        })?;

    let object = state.attachments.fetch(&key).await?;
    let nosniff = (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));

    let response = match inline_image_type(&object.content_type) {
        Some(content_type) => (
            [
                (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
                nosniff,
            ],
            object.bytes,
        )
            .into_response(),
        None => (
            [
                (
                    header::CONTENT_TYPE,
                    HeaderValue::from_static(OPAQUE_CONTENT_TYPE),
                ),
                nosniff,
                (
                    header::CONTENT_DISPOSITION,
                    HeaderValue::from_static("attachment"),
                ),
            ],
            object.bytes,
        )
            .into_response(),
    };
    Ok(response)
}
