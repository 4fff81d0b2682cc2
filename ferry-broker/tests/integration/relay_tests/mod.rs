mod test_role_enforcement;
