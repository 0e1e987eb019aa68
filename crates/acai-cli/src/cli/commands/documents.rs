//! Document command handlers.

use std::path::Path;

use acai_core::api::{ApiClient, validate_upload};
use acai_core::documents::{DocumentQuery, cite, filter_pages};
use anyhow::{Context, Result};

use crate::cli::{ListArgs, render};

impl From<&ListArgs> for DocumentQuery {
    fn from(args: &ListArgs) -> Self {
        DocumentQuery {
            file_type: args.file_type.clone(),
            status: args.status.clone(),
            date: args.date.clone(),
            search: args.search.clone(),
            sort_by: args.sort,
            order: args.order,
        }
    }
}

pub async fn list(client: &ApiClient, args: &ListArgs) -> Result<()> {
    let documents = client.list_documents().await.context("list documents")?;
    let shown = DocumentQuery::from(args).apply(&documents);
    if shown.is_empty() {
        println!("No documents found.");
    } else {
        for document in &shown {
            println!("{}", render::document_line(document));
        }
    }
    Ok(())
}

pub async fn upload(client: &ApiClient, path: &Path, force: bool) -> Result<()> {
    let filename = validate_upload(path)?;
    if !force
        && client
            .check_duplicate(&filename)
            .await
            .context("check for duplicates")?
    {
        anyhow::bail!("'{filename}' already exists; pass --force to upload it again");
    }

    let document = client
        .upload_document(path)
        .await
        .with_context(|| format!("upload {}", path.display()))?;
    println!("Uploaded {} as {}", document.filename, document.id);
    Ok(())
}

pub async fn delete(client: &ApiClient, id: &str) -> Result<()> {
    client
        .delete_document(id)
        .await
        .with_context(|| format!("delete document '{id}'"))?;
    println!("Deleted document {id}");
    Ok(())
}

pub async fn pages(
    client: &ApiClient,
    id: &str,
    search: Option<&str>,
    cite_page: Option<u32>,
) -> Result<()> {
    let pages = client
        .document_pages(id)
        .await
        .with_context(|| format!("load pages of '{id}'"))?;

    if let Some(number) = cite_page {
        let page = pages
            .iter()
            .find(|p| p.page_number == number)
            .with_context(|| format!("Document '{id}' has no page {number}"))?;
        let documents = client.list_documents().await.context("list documents")?;
        let document = documents
            .iter()
            .find(|d| d.id == id)
            .with_context(|| format!("Document '{id}' not found"))?;
        println!("{}", cite(&page.content, page, document));
        return Ok(());
    }

    let matching = filter_pages(&pages, search.unwrap_or_default());
    if matching.is_empty() {
        println!("No pages found.");
    }
    for page in matching {
        println!("--- Page {} ---", page.page_number);
        println!("{}", page.content);
    }
    Ok(())
}
