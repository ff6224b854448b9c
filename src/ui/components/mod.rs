pub mod feedback_panel;
pub mod menu;
pub mod mistake_list;
pub mod question_panel;
pub mod stats_sidebar;
