mod registers;
mod status;
