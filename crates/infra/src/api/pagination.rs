//! Offset pagination across list endpoints
//!
//! Pages are fetched strictly in order: page k+1 is requested only after
//! page k was decoded, at `offset + limit` as echoed by the server (which
//! may clamp the requested limit). The aggregate is all-or-nothing.

use std::marker::PhantomData;

use pagerline_domain::constants::QUERY_OFFSET;
use pagerline_domain::{ListStats, PageEnvelope};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use super::client::ApiClient;
use super::errors::ClientError;
use super::request::{ApiRequest, RequestContext};

/// Decodes one page body into its items and pagination stats
pub trait PageDecoder<T>: Send + Sync {
    fn decode(&self, body: &[u8]) -> Result<PageEnvelope<T>, ClientError>;
}

impl<T, F> PageDecoder<T> for F
where
    F: Fn(&[u8]) -> Result<PageEnvelope<T>, ClientError> + Send + Sync,
{
    fn decode(&self, body: &[u8]) -> Result<PageEnvelope<T>, ClientError> {
        self(body)
    }
}

/// Decoder for the common shape: stats at the top level next to one array
/// named after the resource (`"teams": [...]`).
pub struct JsonPage<T> {
    key: String,
    _items: PhantomData<fn() -> T>,
}

impl<T> JsonPage<T> {
    /// Decode pages whose items live under `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), _items: PhantomData }
    }
}

impl<T: DeserializeOwned> PageDecoder<T> for JsonPage<T> {
    fn decode(&self, body: &[u8]) -> Result<PageEnvelope<T>, ClientError> {
        let mut object: Map<String, Value> = serde_json::from_slice(body)
            .map_err(|err| ClientError::Decode(format!("list response: {err}")))?;

        let items = match object.remove(&self.key) {
            Some(Value::Null) | None => {
                return Err(ClientError::Decode(format!(
                    "list response has no `{}` array",
                    self.key
                )))
            }
            Some(items) => serde_json::from_value(items)
                .map_err(|err| ClientError::Decode(format!("`{}` items: {err}", self.key)))?,
        };
        let stats: ListStats = serde_json::from_value(Value::Object(object))
            .map_err(|err| ClientError::Decode(format!("pagination stats: {err}")))?;

        Ok(PageEnvelope::new(stats, items))
    }
}

impl ApiClient {
    /// Collect every page of a list endpoint.
    ///
    /// `request` describes the first page and is sent unchanged (any
    /// caller-set `limit` is kept); later pages only replace `offset`.
    ///
    /// # Errors
    /// The first dispatch or decode error aborts the walk and discards the
    /// items collected so far. [`ClientError::Pagination`] when the server
    /// reports more pages but no way to advance.
    pub async fn collect_all<T, D>(
        &self,
        ctx: &RequestContext,
        request: ApiRequest,
        decoder: &D,
    ) -> Result<Vec<T>, ClientError>
    where
        D: PageDecoder<T> + ?Sized,
    {
        let mut items = Vec::new();
        let mut page_request = request;
        let mut pages = 0_usize;

        loop {
            let response = self.dispatch(ctx, page_request.clone()).await?;
            let page = decoder.decode(response.bytes())?;
            pages += 1;
            items.extend(page.items);

            let stats = page.stats;
            if !stats.more {
                debug!(pages, items = items.len(), "pagination complete");
                return Ok(items);
            }

            let next = stats.next_offset();
            if stats.limit == 0 || page_request.offset().is_some_and(|current| next <= current) {
                return Err(ClientError::Pagination(format!(
                    "server reported more results but offset cannot advance (offset {}, limit {})",
                    stats.offset, stats.limit
                )));
            }
            debug!(page = pages, next_offset = next, "requesting next page");
            page_request = page_request.set_query(QUERY_OFFSET, next.to_string());
        }
    }

    /// [`ApiClient::collect_all`] over a GET of `path` decoded with
    /// [`JsonPage`].
    ///
    /// # Errors
    /// See [`ApiClient::collect_all`].
    pub async fn list_all<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        path: &str,
        key: &str,
    ) -> Result<Vec<T>, ClientError> {
        self.collect_all(ctx, ApiRequest::get(path), &JsonPage::<T>::new(key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize, PartialEq)]
    struct Team {
        id: String,
    }

    #[test]
    fn json_page_splits_items_from_stats() {
        let body = br#"{"teams":[{"id":"T1"},{"id":"T2"}],"more":true,"offset":0,"limit":2,"total":0}"#;
        let page = JsonPage::<Team>::new("teams").decode(body).unwrap();

        assert_eq!(page.items, vec![Team { id: "T1".into() }, Team { id: "T2".into() }]);
        assert!(page.stats.more);
        assert_eq!(page.stats.next_offset(), 2);
    }

    #[test]
    fn json_page_requires_the_resource_array() {
        let err = JsonPage::<Team>::new("teams").decode(br#"{"more":false}"#).unwrap_err();
        assert!(matches!(err, ClientError::Decode(msg) if msg.contains("teams")));
    }

    #[test]
    fn closures_are_decoders() {
        let decoder = |_: &[u8]| -> Result<PageEnvelope<u32>, ClientError> {
            Ok(PageEnvelope::new(ListStats::default(), vec![1, 2]))
        };
        assert_eq!(decoder.decode(b"").unwrap().items, vec![1, 2]);
    }
}
