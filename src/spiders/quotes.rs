// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scraper::{ElementRef, Html, Selector};

use crate::domain::models::item::Item;
use crate::domain::models::request::Request;
use crate::engines::traits::FetchResponse;
use crate::spiders::{ParseOutput, Spider};
use crate::utils::errors::RuntimeError;
use crate::utils::url_utils::resolve_url;

/// quotes.toscrape.com 爬虫
///
/// 每个 `div.quote` 产出一个条目（正文、作者、标签），并跟随"下一页"链接
pub struct QuotesSpider {
    quote: Selector,
    text: Selector,
    author: Selector,
    tag: Selector,
    next: Selector,
}

impl QuotesSpider {
    pub fn new() -> Self {
        Self {
            quote: selector("div.quote"),
            text: selector("span.text"),
            author: selector("small.author"),
            tag: selector("div.tags a.tag"),
            next: selector("li.next a"),
        }
    }

    fn first_text(element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
        element
            .select(selector)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
    }
}

impl Default for QuotesSpider {
    fn default() -> Self {
        Self::new()
    }
}

// 选择器均为常量字面量
fn selector(css: &'static str) -> Selector {
    match Selector::parse(css) {
        Ok(selector) => selector,
        Err(e) => panic!("invalid built-in selector {:?}: {}", css, e),
    }
}

impl Spider for QuotesSpider {
    fn name(&self) -> &'static str {
        "quotes"
    }

    fn start_urls(&self) -> Vec<&'static str> {
        vec!["http://quotes.toscrape.com/"]
    }

    fn parse(
        &self,
        _request: &Request,
        response: &FetchResponse,
    ) -> Result<ParseOutput, RuntimeError> {
        let document = Html::parse_document(&response.content);
        let mut output = ParseOutput::new();

        for quote in document.select(&self.quote) {
            let text = Self::first_text(&quote, &self.text).ok_or_else(|| RuntimeError::Parse {
                url: response.url.to_string(),
                reason: "quote without text".to_string(),
            })?;
            let author = Self::first_text(&quote, &self.author).unwrap_or_default();
            let tags: Vec<String> = quote
                .select(&self.tag)
                .map(|t| t.text().collect::<String>().trim().to_string())
                .collect();

            output.add_item(
                Item::new(self.name(), response.url.as_str())
                    .with_field("text", text)
                    .with_field("author", author)
                    .with_field("tags", tags),
            );
        }

        if let Some(href) = document
            .select(&self.next)
            .next()
            .and_then(|a| a.value().attr("href"))
        {
            // 重定向后相对链接以最终地址为准，与条目记录的URL一致
            let next = resolve_url(&response.url, href)
                .map_err(|e| e.to_string())
                .and_then(|url| Request::get(url.as_str()).map_err(|e| e.to_string()))
                .map_err(|reason| RuntimeError::Parse {
                    url: response.url.to_string(),
                    reason,
                })?;
            output.add_request(next);
        }

        Ok(output)
    }
}
