pub mod todo_list;
pub mod todo_list_item;
