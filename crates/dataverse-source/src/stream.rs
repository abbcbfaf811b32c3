//! Lazy, paginated stream of modified contacts.

use crate::client::DataverseClient;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::VecDeque;
use sync_core::{Contact, ContactStream};

/// Dataverse caps `$top` at 5000 rows per page.
const PAGE_SIZE: u64 = 5000;

/// Attribute projection requested from the contacts collection.
const SELECT_FIELDS: &str = "contactid,firstname,lastname,emailaddress1,modifiedon";

/// One page of the contacts collection.
#[derive(Debug, Deserialize)]
struct ContactPage {
    #[serde(default)]
    value: Vec<Contact>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

/// Where the next page comes from.
enum PageCursor {
    /// First request, built from the retained query state.
    Start,
    /// Server-issued continuation link, followed verbatim.
    Next(String),
    /// No further pages: the server ran out or the limit was reached.
    Exhausted,
}

/// Build the first-page URL for the contacts query.
///
/// Only the first page is built client-side; continuation pages come back
/// as opaque `@odata.nextLink` URLs.
pub fn contacts_url(resource_url: &str, since: DateTime<Utc>, top: u64) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("$select", SELECT_FIELDS)
        .append_pair("$filter", &format!("modifiedon gt {}", since.to_rfc3339()))
        .append_pair("$top", &top.to_string())
        .finish();
    format!("{resource_url}/api/data/v9.2/contacts?{query}")
}

/// A finite, forward-only stream over contacts modified after a watermark.
///
/// The stream keeps its own copy of the query state (watermark, page size,
/// remaining limit) for its whole lifetime instead of leaving it encoded
/// only in the first URL. One page is buffered at a time and the next page
/// is fetched only when the buffer runs dry, so a caller that stops early
/// causes no further requests. A fetch error ends the stream.
pub struct DataverseContactStream {
    client: DataverseClient,
    since: DateTime<Utc>,
    page_size: u64,
    remaining: Option<u64>,
    cursor: PageCursor,
    buffer: VecDeque<Contact>,
    finished: bool,
}

impl DataverseContactStream {
    /// Stream contacts modified after `since`, yielding at most `limit`.
    pub fn new(client: DataverseClient, since: DateTime<Utc>, limit: Option<u64>) -> Self {
        DataverseContactStream {
            client,
            since,
            page_size: PAGE_SIZE,
            remaining: limit,
            cursor: PageCursor::Start,
            buffer: VecDeque::new(),
            finished: false,
        }
    }

    /// Fetch the next page into the buffer, honoring the remaining limit.
    async fn fetch_next_page(&mut self) -> Result<()> {
        let url = match &self.cursor {
            PageCursor::Start => {
                let top = match self.remaining {
                    Some(limit) => self.page_size.min(limit),
                    None => self.page_size,
                };
                contacts_url(self.client.resource_url(), self.since, top)
            }
            PageCursor::Next(link) => link.clone(),
            PageCursor::Exhausted => {
                self.finished = true;
                return Ok(());
            }
        };

        let page: ContactPage = self.client.get_json(&url).await?;
        tracing::debug!("Fetched {} contacts from Dataverse", page.value.len());

        let mut rows = page.value;
        self.cursor = match page.next_link {
            Some(link) => PageCursor::Next(link),
            None => PageCursor::Exhausted,
        };

        if let Some(remaining) = self.remaining {
            if rows.len() as u64 >= remaining {
                // Limit reached mid-page: keep the earliest rows and drop
                // any pending continuation link.
                rows.truncate(remaining as usize);
                self.cursor = PageCursor::Exhausted;
            }
            self.remaining = Some(remaining - rows.len() as u64);
        }

        if rows.is_empty() && matches!(self.cursor, PageCursor::Exhausted) {
            self.finished = true;
        }
        self.buffer.extend(rows);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ContactStream for DataverseContactStream {
    async fn next(&mut self) -> Option<anyhow::Result<Contact>> {
        while self.buffer.is_empty() && !self.finished {
            if let Err(e) = self.fetch_next_page().await {
                self.finished = true;
                return Some(Err(e.into()));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataverseError;
    use crate::DataverseOpts;
    use chrono::TimeZone;
    use http_transport::{HttpMethod, HttpResponse, MockTransport};
    use std::sync::Arc;

    const TOKEN_URL: &str = "https://login.microsoftonline.com/tenant-1/oauth2/v2.0/token";
    const RESOURCE: &str = "https://org.crm.dynamics.com";

    fn since() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn mock_with_token() -> MockTransport {
        let mock = MockTransport::new();
        mock.push_response(
            HttpMethod::Post,
            TOKEN_URL,
            HttpResponse {
                status: 200,
                headers: vec![],
                body: br#"{"access_token": "tok-1", "expires_in": 3600}"#.to_vec(),
            },
        );
        mock
    }

    fn stream_over(mock: &MockTransport, limit: Option<u64>) -> DataverseContactStream {
        let opts = DataverseOpts {
            dataverse_tenant_id: "tenant-1".to_string(),
            dataverse_client_id: "client-1".to_string(),
            dataverse_client_secret: "s3cret".to_string(),
            dataverse_resource: RESOURCE.to_string(),
        };
        let client = DataverseClient::new(&opts, Arc::new(mock.clone())).unwrap();
        DataverseContactStream::new(client, since(), limit)
    }

    fn page(start: usize, count: usize, next_link: Option<&str>) -> HttpResponse {
        let rows: Vec<serde_json::Value> = (start..start + count)
            .map(|i| {
                serde_json::json!({
                    "contactid": format!("c-{i}"),
                    "firstname": format!("First{i}"),
                    "lastname": format!("Last{i}"),
                    "emailaddress1": format!("c{i}@example.com"),
                    "modifiedon": "2024-06-01T00:00:00Z"
                })
            })
            .collect();
        let mut body = serde_json::json!({ "value": rows });
        if let Some(link) = next_link {
            body["@odata.nextLink"] = serde_json::json!(link);
        }
        HttpResponse {
            status: 200,
            headers: vec![],
            body: body.to_string().into_bytes(),
        }
    }

    async fn drain(stream: &mut DataverseContactStream) -> Vec<Contact> {
        let mut contacts = Vec::new();
        while let Some(result) = stream.next().await {
            contacts.push(result.unwrap());
        }
        contacts
    }

    #[test]
    fn test_contacts_url_encodes_query_options() {
        let url = contacts_url(RESOURCE, since(), 5000);
        assert_eq!(
            url,
            "https://org.crm.dynamics.com/api/data/v9.2/contacts\
             ?%24select=contactid%2Cfirstname%2Clastname%2Cemailaddress1%2Cmodifiedon\
             &%24filter=modifiedon+gt+2024-01-01T00%3A00%3A00%2B00%3A00\
             &%24top=5000"
        );
    }

    #[tokio::test]
    async fn test_follows_next_link_and_preserves_order() {
        let mock = mock_with_token();
        let page2_url = format!("{RESOURCE}/api/data/v9.2/contacts?page=2");
        mock.push_response(
            HttpMethod::Get,
            &contacts_url(RESOURCE, since(), 5000),
            page(0, 3, Some(&page2_url)),
        );
        mock.push_response(HttpMethod::Get, &page2_url, page(3, 2, None));

        let mut stream = stream_over(&mock, None);
        let contacts = drain(&mut stream).await;

        let emails: Vec<_> = contacts
            .iter()
            .map(|contact| contact.email.clone().unwrap())
            .collect();
        assert_eq!(
            emails,
            vec![
                "c0@example.com",
                "c1@example.com",
                "c2@example.com",
                "c3@example.com",
                "c4@example.com"
            ]
        );

        let gets = mock
            .requests()
            .iter()
            .filter(|request| request.method == HttpMethod::Get)
            .count();
        assert_eq!(gets, 2);
    }

    #[tokio::test]
    async fn test_limit_truncates_mid_page_and_stops_paging() {
        // 12000 modified rows on the server, limit 7000: full first page,
        // second page cut at 2000, third page never requested.
        let mock = mock_with_token();
        let page2_url = format!("{RESOURCE}/api/data/v9.2/contacts?page=2");
        let page3_url = format!("{RESOURCE}/api/data/v9.2/contacts?page=3");
        mock.push_response(
            HttpMethod::Get,
            &contacts_url(RESOURCE, since(), 5000),
            page(0, 5000, Some(&page2_url)),
        );
        // The second page still advertises a continuation link; the limit
        // must stop the stream from ever requesting it.
        mock.push_response(HttpMethod::Get, &page2_url, page(5000, 5000, Some(&page3_url)));

        let mut stream = stream_over(&mock, Some(7000));
        let contacts = drain(&mut stream).await;

        assert_eq!(contacts.len(), 7000);
        assert_eq!(contacts[6999].email.as_deref(), Some("c6999@example.com"));

        let gets: Vec<_> = mock
            .requests()
            .iter()
            .filter(|request| request.method == HttpMethod::Get)
            .map(|request| request.url.clone())
            .collect();
        assert_eq!(gets.len(), 2);
        assert!(!gets.contains(&page3_url));
    }

    #[tokio::test]
    async fn test_limit_below_page_size_shrinks_top() {
        // $top reflects min(page size, limit), so the first URL carries 7.
        let mock = mock_with_token();
        mock.push_response(
            HttpMethod::Get,
            &contacts_url(RESOURCE, since(), 7),
            page(0, 7, None),
        );

        let mut stream = stream_over(&mock, Some(7));
        let contacts = drain(&mut stream).await;
        assert_eq!(contacts.len(), 7);
    }

    #[tokio::test]
    async fn test_empty_first_page_ends_the_stream() {
        let mock = mock_with_token();
        mock.push_response(
            HttpMethod::Get,
            &contacts_url(RESOURCE, since(), 5000),
            page(0, 0, None),
        );

        let mut stream = stream_over(&mock, None);
        assert!(stream.next().await.is_none());
        assert!(stream.next().await.is_none());

        let gets = mock
            .requests()
            .iter()
            .filter(|request| request.method == HttpMethod::Get)
            .count();
        assert_eq!(gets, 1);
    }

    #[tokio::test]
    async fn test_fetch_error_ends_the_stream() {
        let mock = mock_with_token();
        mock.push_response(
            HttpMethod::Get,
            &contacts_url(RESOURCE, since(), 5000),
            HttpResponse {
                status: 400,
                headers: vec![],
                body: b"Could not find a property named 'modifiedon'".to_vec(),
            },
        );

        let mut stream = stream_over(&mock, None);

        let err = stream.next().await.unwrap().unwrap_err();
        let source = err.downcast_ref::<DataverseError>().unwrap();
        assert!(matches!(source, DataverseError::Http { status: 400, .. }));

        // Forward-only: the failed stream stays finished.
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_limit_larger_than_result_set_drains_everything() {
        let mock = mock_with_token();
        mock.push_response(
            HttpMethod::Get,
            &contacts_url(RESOURCE, since(), 100),
            page(0, 4, None),
        );

        let mut stream = stream_over(&mock, Some(100));
        let contacts = drain(&mut stream).await;
        assert_eq!(contacts.len(), 4);
    }
}
