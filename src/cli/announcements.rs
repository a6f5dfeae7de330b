use colored::Colorize;

use crate::announcements::{create_announcement, delete_announcement, list_announcements};
use crate::error::Result;
use crate::models::Announcement;

use super::Session;

const WRAP_WIDTH: usize = 72;

fn render(a: &Announcement) -> String {
    let date = a.date_created.get(..10).unwrap_or(&a.date_created);
    let body = textwrap::indent(&textwrap::fill(&a.content, WRAP_WIDTH), "  ");
    format!(
        "{} {} {}\n{}",
        format!("#{}", a.id).dimmed(),
        a.title.bold(),
        format!("[{}] {date}", a.category).dimmed(),
        body
    )
}

pub fn list(as_user: Option<&str>, category: &str) -> Result<()> {
    let session = Session::open(as_user)?;
    let items = list_announcements(&session.conn, category)?;
    if items.is_empty() {
        println!("No announcements.");
        return Ok(());
    }
    for a in &items {
        println!("{}\n", render(a));
    }
    Ok(())
}

pub fn add(as_user: Option<&str>, title: &str, content: &str, category: &str) -> Result<()> {
    let session = Session::admin(as_user)?;
    let id = create_announcement(&session.conn, title, content, category)?;
    println!("Posted announcement {id}: {title}");
    Ok(())
}

pub fn delete(as_user: Option<&str>, id: i64) -> Result<()> {
    let session = Session::admin(as_user)?;
    delete_announcement(&session.conn, id)?;
    println!("Deleted announcement {id}");
    Ok(())
}
