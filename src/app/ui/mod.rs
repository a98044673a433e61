mod controls;
mod details;
mod node_list;
mod panels;

pub(super) use details::link_summary_lines;
