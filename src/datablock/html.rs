//! HTML serialization of data-block markup.
//!
//! Output never references a stylesheet. Every element carries its own
//! `style` attribute, colors included.

use std::fmt::Write as FmtWrite;

use super::{Block, Markup, Table, TableLayout};
use crate::style::{fmt_px, Color};

pub(super) fn to_html(markup: &Markup) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "<div style=\"font-size:{}px;color:{};\">",
        fmt_px(markup.font_size),
        Color::BLACK.to_css()
    );
    for block in &markup.blocks {
        write_block(&mut out, block, markup.font_size);
    }
    out.push_str("</div>");
    out
}

fn write_block(out: &mut String, block: &Block, base: f64) {
    let gap = fmt_px(base * 0.5);
    match block {
        Block::Heading { text, style } => {
            let _ = write!(
                out,
                "<div style=\"{}margin-bottom:{}px;\">{}</div>",
                style.css(),
                gap,
                escape(text)
            );
        }
        Block::Paragraph { text, style } => {
            let _ = write!(
                out,
                "<p style=\"{}margin:0 0 {}px 0;white-space:pre-wrap;\">{}</p>",
                style.css(),
                gap,
                escape(text)
            );
        }
        Block::List { items, style } => {
            let _ = write!(out, "<ul style=\"margin:0;padding-left:{}px;\">", fmt_px(base * 1.5));
            for item in items {
                let _ = write!(out, "<li style=\"{}\">{}</li>", style.css(), escape(item));
            }
            out.push_str("</ul>");
        }
        Block::Table(table) => write_table(out, table),
    }
}

fn write_table(out: &mut String, table: &Table) {
    let black = Color::BLACK.to_css();
    let table_border = match table.layout {
        TableLayout::Grid => format!("border:1px solid {};", black),
        _ => String::new(),
    };
    let _ = write!(
        out,
        "<table style=\"width:100%;border-collapse:collapse;color:{};{}\">",
        black, table_border
    );

    out.push_str("<thead><tr");
    write_background(out, table.header.background);
    out.push('>');
    for (i, cell) in table.header.cells.iter().enumerate() {
        let _ = write!(
            out,
            "<th style=\"{}{}{}\">{}</th>",
            table.header_style.css(),
            cell_css(table, true),
            width_css(table, i),
            escape(cell)
        );
    }
    out.push_str("</tr></thead><tbody>");

    for row in &table.rows {
        out.push_str("<tr");
        write_background(out, row.background);
        out.push('>');
        for cell in &row.cells {
            let _ = write!(
                out,
                "<td style=\"{}{}\">{}</td>",
                table.body_style.css(),
                cell_css(table, false),
                escape(cell)
            );
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
}

fn write_background(out: &mut String, background: Option<Color>) {
    if let Some(bg) = background {
        let _ = write!(out, " style=\"background-color:{};\"", bg.to_css());
    }
}

fn width_css(table: &Table, column: usize) -> String {
    table
        .column_widths
        .get(column)
        .map(|w| format!("width:{}%;", fmt_px(w * 100.0)))
        .unwrap_or_default()
}

fn cell_css(table: &Table, header: bool) -> String {
    let black = Color::BLACK.to_css();
    let border = match (table.layout, header) {
        (TableLayout::Grid, _) => format!("border:1px solid {};", black),
        (TableLayout::Ruled, true) => format!("border-bottom:2px solid {};", black),
        (TableLayout::Ruled, false) => format!("border-bottom:1px solid {};", black),
        (TableLayout::Banded, true) => format!("border-bottom:2px solid {};", black),
        (TableLayout::Banded, false) => String::new(),
    };
    format!("{}padding:4px 6px;text-align:left;", border)
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
