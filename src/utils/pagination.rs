use serde::Serialize;
use url::form_urlencoded;

/// Pages shown on each side of the current one before collapsing into "...".
const ON_EACH_SIDE: u32 = 3;

#[derive(Debug, Serialize, PartialEq)]
pub struct PageLink {
    pub url: Option<String>,
    pub label: String,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct PageMeta {
    pub current_page: u32,
    pub from: Option<i64>,
    pub last_page: u32,
    pub links: Vec<PageLink>,
    pub path: String,
    pub per_page: u32,
    pub to: Option<i64>,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct PageLinks {
    pub first: String,
    pub last: String,
    pub prev: Option<String>,
    pub next: Option<String>,
}

pub fn page_url(path: &str, page: u32) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("page", &page.to_string())
        .finish();
    format!("{}?{}", path, query)
}

pub fn last_page(total: i64, per_page: u32) -> u32 {
    let per_page = i64::from(per_page.max(1));
    (((total + per_page - 1) / per_page).max(1)) as u32
}

/// Page numbers to render, `None` marking a collapsed gap.
fn window(current: u32, last: u32) -> Vec<Option<u32>> {
    let side = ON_EACH_SIDE;
    if last < side * 2 + 8 {
        return (1..=last).map(Some).collect();
    }

    let head = [Some(1), Some(2), None];
    let tail = [None, Some(last - 1), Some(last)];
    let span = side * 2 + 2;

    if current <= span {
        (1..=span).map(Some).chain(tail).collect()
    } else if current > last - span {
        head.into_iter().chain((last - span + 1..=last).map(Some)).collect()
    } else {
        head.into_iter()
            .chain((current - side..=current + side).map(Some))
            .chain(tail)
            .collect()
    }
}

/// Builds the `meta` and `links` blocks of a paginated response.
pub fn paginate(path: &str, page: u32, per_page: u32, total: i64, count: usize) -> (PageMeta, PageLinks) {
    let last = last_page(total, per_page);
    let (from, to) = if count == 0 {
        (None, None)
    } else {
        let from = i64::from(page.saturating_sub(1)) * i64::from(per_page) + 1;
        (Some(from), Some(from + count as i64 - 1))
    };

    let prev = (page > 1).then(|| page_url(path, page - 1));
    let next = (page < last).then(|| page_url(path, page + 1));

    let mut links = vec![PageLink {
        url: prev.clone(),
        label: "&laquo; Previous".to_string(),
        active: false,
    }];
    links.extend(window(page, last).into_iter().map(|entry| match entry {
        Some(n) => PageLink {
            url: Some(page_url(path, n)),
            label: n.to_string(),
            active: n == page,
        },
        None => PageLink {
            url: None,
            label: "...".to_string(),
            active: false,
        },
    }));
    links.push(PageLink {
        url: next.clone(),
        label: "Next &raquo;".to_string(),
        active: false,
    });

    let meta = PageMeta {
        current_page: page,
        from,
        last_page: last,
        links,
        path: path.to_string(),
        per_page,
        to,
        total,
    };
    let links = PageLinks {
        first: page_url(path, 1),
        last: page_url(path, last),
        prev,
        next,
    };
    (meta, links)
}
