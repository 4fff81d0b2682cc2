mod test_disconnect_triggers_leave;
mod test_read_deadline;
mod test_keep_alive;
mod test_slow_consumer;
