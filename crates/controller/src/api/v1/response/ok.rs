// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Success response types for REST APIv1
//!
//! Pagination follows the GitHub REST APIv3, i.e. page hints are included inside the Link HTTP header.

use actix_web::body::BoxBody;
use actix_web::http::header;
use actix_web::{HttpResponse, Responder};
use serde::Serialize;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagePaginationLinks {
    page: i64,
    per_page: i64,
    first: Option<i64>,
    prev: Option<i64>,
    next: Option<i64>,
    last: Option<i64>,
}

impl PagePaginationLinks {
    pub fn new(per_page: i64, page: i64, total: i64) -> Self {
        let last_page = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };

        Self {
            page,
            per_page,
            first: (page > 1).then_some(1),
            prev: (page > 1).then_some(page - 1),
            next: (page < last_page).then_some(page + 1),
            last: (page < last_page).then_some(last_page),
        }
    }

    /// Link relations with their target urls, the `page` query parameter of `url` is replaced
    pub fn as_links_vec(&self, url: &Url) -> Vec<(&'static str, String)> {
        let query = url
            .query_pairs()
            .into_owned()
            .filter(|(key, _)| key != "page")
            .collect::<Vec<_>>();

        let mut base = url.clone();
        base.query_pairs_mut().clear().extend_pairs(query.iter());

        [
            ("first", self.first),
            ("prev", self.prev),
            ("next", self.next),
            ("last", self.last),
        ]
        .into_iter()
        .filter_map(|(rel, page)| {
            let page = page?;
            let mut url = base.clone();
            url.query_pairs_mut().append_pair("page", &page.to_string());

            Some((rel, url.to_string()))
        })
        .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse<T: Serialize> {
    pagination: Option<PagePaginationLinks>,
    data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates new [`ApiResponse`]
    pub fn new(data: T) -> Self {
        Self {
            pagination: None,
            data,
        }
    }

    /// Transforms [`ApiResponse`] to also return page based pagination links.
    pub fn with_page_pagination(mut self, per_page: i64, page: i64, total: i64) -> Self {
        self.pagination = Some(PagePaginationLinks::new(per_page, page, total));

        self
    }
}

impl<T: Serialize> Responder for ApiResponse<T> {
    type Body = BoxBody;

    fn respond_to(self, req: &actix_web::HttpRequest) -> HttpResponse {
        let body = match serde_json::to_string(&self.data) {
            Ok(body) => body,
            Err(err) => {
                return HttpResponse::from_error(actix_web::error::JsonPayloadError::Serialize(
                    err,
                ))
            }
        };

        let mut response = HttpResponse::Ok();
        response.content_type(mime::APPLICATION_JSON);

        if let Some(pagination) = self.pagination {
            let link = extract_full_url_from_request(req)
                .map(|url| pagination.as_links_vec(&url))
                .and_then(|links| Ok(vec_to_header_value(links)?));

            match link {
                Ok(link) => {
                    response.insert_header((header::LINK, link));
                }
                Err(e) => {
                    log::error!("Failed to build pagination link header, {}", e);
                    return HttpResponse::InternalServerError().finish();
                }
            }
        }

        response.body(body)
    }
}

fn vec_to_header_value(
    vec: Vec<(&'static str, String)>,
) -> Result<header::HeaderValue, header::InvalidHeaderValue> {
    let buf = vec
        .iter()
        .map(|(rel, url)| format!("<{url}>; rel=\"{rel}\""))
        .collect::<Vec<_>>()
        .join(",");

    header::HeaderValue::from_str(&buf)
}

fn extract_full_url_from_request(req: &actix_web::HttpRequest) -> Result<Url, anyhow::Error> {
    let conn = req.connection_info();

    let url = Url::parse(&format!(
        "{scheme}://{host}/",
        scheme = conn.scheme(),
        host = conn.host()
    ))?;

    Ok(url.join(&req.uri().to_string())?)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pagination_of_a_middle_page() {
        let links = PagePaginationLinks::new(10, 2, 35);

        assert_eq!(links.first, Some(1));
        assert_eq!(links.prev, Some(1));
        assert_eq!(links.next, Some(3));
        assert_eq!(links.last, Some(4));
    }

    #[test]
    fn pagination_of_the_only_page() {
        let links = PagePaginationLinks::new(30, 1, 3);

        assert_eq!(links.first, None);
        assert_eq!(links.prev, None);
        assert_eq!(links.next, None);
        assert_eq!(links.last, None);
    }

    #[test]
    fn links_replace_the_page_parameter() {
        let url = Url::parse("https://gathr.example/v1/events?per_page=10&page=2").unwrap();
        let links = PagePaginationLinks::new(10, 2, 30).as_links_vec(&url);

        assert_eq!(
            links,
            vec![
                (
                    "first",
                    "https://gathr.example/v1/events?per_page=10&page=1".to_string()
                ),
                (
                    "prev",
                    "https://gathr.example/v1/events?per_page=10&page=1".to_string()
                ),
                (
                    "next",
                    "https://gathr.example/v1/events?per_page=10&page=3".to_string()
                ),
                (
                    "last",
                    "https://gathr.example/v1/events?per_page=10&page=3".to_string()
                ),
            ]
        );
    }
}
