//! Key-value operations built on [`RequestGateway::call`].

use lucid_protocol::{Codec, JsonCodec, KeyOperation, PatchBody};
use lucid_transport::{HttpResponse, HttpTransport, Method};
use serde::Serialize;

use crate::{GatewayError, KvRequest, RequestGateway};

impl<T: HttpTransport> RequestGateway<T> {
    /// `GET /kv/{key}`: the raw stored value.
    pub async fn get_key(&self, key: &str) -> Result<HttpResponse, GatewayError> {
        self.call(KvRequest::new(key)).await
    }

    /// `PUT /kv/{key}` with an arbitrary body, sent as-is.
    pub async fn store_any(
        &self,
        key: &str,
        body: impl Into<Vec<u8>>,
    ) -> Result<HttpResponse, GatewayError> {
        self.call(KvRequest::new(key).method(Method::Put).body(body))
            .await
    }

    /// `PUT /kv/{key}` with `value` encoded as JSON.
    pub async fn store_json<V: Serialize>(
        &self,
        key: &str,
        value: &V,
    ) -> Result<HttpResponse, GatewayError> {
        let body = JsonCodec.encode(value)?;
        let request = KvRequest::new(key)
            .method(Method::Put)
            .header("Content-Type", JsonCodec.content_type())
            .body(body);
        self.call(request).await
    }

    /// `DELETE /kv/{key}`.
    pub async fn delete_key(&self, key: &str) -> Result<HttpResponse, GatewayError> {
        self.call(KvRequest::new(key).method(Method::Delete)).await
    }

    /// `HEAD /kv/{key}`. A missing key is a
    /// [`GatewayError::RemoteError`] with status 404.
    pub async fn exists_key(&self, key: &str) -> Result<HttpResponse, GatewayError> {
        self.call(KvRequest::new(key).method(Method::Head)).await
    }

    /// `PATCH /kv/{key}` with `{"operation":"lock"}`.
    pub async fn lock_key(&self, key: &str) -> Result<HttpResponse, GatewayError> {
        self.patch_key(key, KeyOperation::Lock).await
    }

    /// `PATCH /kv/{key}` with `{"operation":"unlock"}`.
    pub async fn unlock_key(&self, key: &str) -> Result<HttpResponse, GatewayError> {
        self.patch_key(key, KeyOperation::Unlock).await
    }

    async fn patch_key(
        &self,
        key: &str,
        operation: KeyOperation,
    ) -> Result<HttpResponse, GatewayError> {
        let body = JsonCodec.encode(&PatchBody { operation })?;
        let request = KvRequest::new(key)
            .method(Method::Patch)
            .header("Content-Type", JsonCodec.content_type())
            .body(body);
        self.call(request).await
    }
}
