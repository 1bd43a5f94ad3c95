mod end_to_end_test;
