use anyhow::{Result, anyhow, bail};
use serde_json::to_string_pretty;
use yomu_copymangas::CopyMangas;
use yomu_lib::prelude::*;

use crate::Command;

pub fn run(source: &CopyMangas, cmd: Command) -> Result<()> {
    let output = match cmd {
        Command::Info => to_string_pretty(&source.get_source_info())?,
        Command::Filters => to_string_pretty(&source.filter_list())?,
        Command::Preferences => to_string_pretty(&source.get_preferences()?)?,
        Command::Popular { page } => to_string_pretty(&source.get_popular_manga(page)?)?,
        Command::Latest { page } => to_string_pretty(&source.get_latest_manga(page)?)?,
        Command::Search {
            page,
            query,
            filters,
        } => {
            let mut inputs = source.filter_list();
            for filter in &filters {
                select_filter(&mut inputs, filter)?;
            }
            to_string_pretty(&source.search_manga(page, query, Some(inputs))?)?
        }
        Command::Detail { path } => to_string_pretty(&source.get_manga_detail(path)?)?,
        Command::Chapters { path } => to_string_pretty(&source.get_chapters(path)?)?,
        Command::Pages { path } => to_string_pretty(&source.get_pages(path)?)?,
        Command::Login => {
            source.login()?;
            format!("logged in, token state {:?}", source.token_state())
        }
        Command::Set { key, value } => {
            let input = preference_input(source.get_preferences()?, &key, &value)?;
            source.set_preferences(vec![input])?;
            format!("{key} updated")
        }
    };

    println!("{output}");
    Ok(())
}

/// Applies a `NAME=INDEX` selection to the matching select filter.
fn select_filter(inputs: &mut [Input], selection: &str) -> Result<()> {
    let (name, index) = selection
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=INDEX, got {selection}"))?;
    let index: i64 = index.trim().parse()?;

    match inputs.iter_mut().find(|input| input.name() == name.trim()) {
        Some(Input::Select { state, .. }) => *state = Some(index),
        Some(_) => bail!("{name} is not a select filter"),
        None => bail!("unknown filter {name}"),
    }
    Ok(())
}

/// Fills the descriptor called `key` with `value`. Select values match by their
/// display text.
fn preference_input(descriptors: Vec<Input>, key: &str, value: &str) -> Result<Input> {
    let mut input = descriptors
        .into_iter()
        .find(|input| input.name() == key)
        .ok_or_else(|| anyhow!("unknown preference {key}"))?;

    match &mut input {
        Input::Text { state, .. } => *state = Some(value.to_string()),
        Input::Checkbox { state, .. } => *state = Some(value.parse()?),
        Input::Select { values, state, .. } => {
            let position = values
                .iter()
                .position(|v| v == value)
                .ok_or_else(|| anyhow!("{value} is not a valid value for {key}"))?;
            *state = Some(position as i64);
        }
        _ => bail!("{key} cannot be set from the command line"),
    }
    Ok(input)
}
