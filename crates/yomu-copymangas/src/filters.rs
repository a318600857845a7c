use yomu_lib::models::Input;

use crate::error::Error;

pub const SCOPE: &str = "文本搜索范围";
pub const GENRE: &str = "题材";
pub const REGION: &str = "地区/状态";
pub const SORT: &str = "排序";

/// Display name and the query value it stands for. An empty value means "any".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub value: String,
}

impl Param {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

const SCOPES: [(&str, &str); 4] = [
    ("全部", ""),
    ("名称", "name"),
    ("作者", "author"),
    ("汉化组", "local"),
];

const REGIONS: [(&str, &str); 5] = [
    ("全部", ""),
    ("日本", "japan"),
    ("韩国", "korea"),
    ("欧美", "west"),
    ("已完结", "finish"),
];

const SORTS: [(&str, &str); 4] = [
    ("热门", "-popular"),
    ("热门(逆序)", "popular"),
    ("更新时间", "-datetime_updated"),
    ("更新时间(逆序)", "datetime_updated"),
];

fn params(pairs: &[(&str, &str)]) -> Vec<Param> {
    pairs.iter().map(|(name, value)| Param::new(name, value)).collect()
}

fn select(name: &str, params: &[Param]) -> Input {
    Input::Select {
        name: name.to_string(),
        values: params
            .iter()
            .map(|p| p.name.clone())
            .collect(),
        state: Some(0),
    }
}

/// Filter descriptors. The genre select is left out until genres are known.
pub fn filter_list(genres: Option<&[Param]>) -> Vec<Input> {
    let mut filters = vec![select(SCOPE, &params(&SCOPES))];
    if let Some(genres) = genres {
        filters.push(select(GENRE, genres));
    }
    filters.push(select(REGION, &params(&REGIONS)));
    filters.push(select(SORT, &params(&SORTS)));
    filters
}

/// Query value picked in the select called `name`; `None` when the select is
/// absent, unset or set to "any".
fn selected(filters: &[Input], name: &str, params: &[Param]) -> Result<Option<String>, Error> {
    let Some(input) = filters.iter().find(|input| input.name() == name) else {
        return Ok(None);
    };

    Ok(input
        .selected_index()?
        .and_then(|index| params.get(index))
        .map(|param| param.value.clone())
        .filter(|value| !value.is_empty()))
}

/// `q_type` for a text search.
pub fn search_scope(filters: &[Input]) -> Result<Option<String>, Error> {
    selected(filters, SCOPE, &params(&SCOPES))
}

/// Parameters for browsing the catalog without a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub theme: Option<String>,
    pub top: Option<String>,
    pub ordering: Option<String>,
}

impl CatalogQuery {
    pub fn from_filters(filters: &[Input], genres: &[Param]) -> Result<Self, Error> {
        Ok(Self {
            theme: selected(filters, GENRE, genres)?,
            top: selected(filters, REGION, &params(&REGIONS))?,
            ordering: selected(filters, SORT, &params(&SORTS))?,
        })
    }
}
