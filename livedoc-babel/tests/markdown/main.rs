mod scenarios;
mod table;
