use serde::{Deserialize, Serialize};
use ts_rs::TS;

const MAX_PAGE_SIZE: u64 = 200;

// 分页查询参数
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/pagination.ts")]
pub struct PaginationQuery {
    #[serde(default = "default_page", deserialize_with = "deserialize_page_number")]
    pub page: u64,
    #[serde(default = "default_size", deserialize_with = "deserialize_page_number")]
    pub size: u64,
}

// 分页响应信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/pagination.ts")]
pub struct PaginationInfo {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl PaginationQuery {
    /// 截取当前页，返回页内条目与分页信息
    pub fn paginate<T>(&self, items: Vec<T>) -> (Vec<T>, PaginationInfo) {
        let page = self.page.max(1);
        let size = self.size.clamp(1, MAX_PAGE_SIZE);
        let total = items.len() as u64;

        let skip = ((page - 1) * size) as usize;
        let page_items = items.into_iter().skip(skip).take(size as usize).collect();

        (
            page_items,
            PaginationInfo {
                page,
                page_size: size,
                total,
                total_pages: total.div_ceil(size),
            },
        )
    }
}

// 查询字符串中的页码是字符串，这里同时接受数字
fn deserialize_page_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{Error, Unexpected, Visitor};
    use std::fmt;

    struct PageVisitor;

    impl<'de> Visitor<'de> for PageVisitor {
        type Value = u64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a positive integer or a string containing one")
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Ok(value)
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            u64::try_from(value).map_err(|_| Error::invalid_value(Unexpected::Signed(value), &self))
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: Error,
        {
            value
                .trim()
                .parse()
                .map_err(|_| Error::invalid_value(Unexpected::Str(value), &self))
        }
    }

    deserializer.deserialize_any(PageVisitor)
}

fn default_page() -> u64 {
    1
}

fn default_size() -> u64 {
    50
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            size: default_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_last_partial_page() {
        let query = PaginationQuery { page: 3, size: 4 };
        let (items, info) = query.paginate((1..=10).collect::<Vec<_>>());
        assert_eq!(items, vec![9, 10]);
        assert_eq!(info.total, 10);
        assert_eq!(info.total_pages, 3);
    }

    #[test]
    fn test_paginate_clamps_zero_values() {
        let query = PaginationQuery { page: 0, size: 0 };
        let (items, info) = query.paginate(vec!["a", "b"]);
        assert_eq!(items, vec!["a"]);
        assert_eq!(info.page, 1);
        assert_eq!(info.page_size, 1);
    }

    #[test]
    fn test_query_from_strings() {
        let query: PaginationQuery = serde_json::from_str(r#"{"page": "2", "size": 5}"#).unwrap();
        assert_eq!(query.page, 2);
        assert_eq!(query.size, 5);
    }
}
