mod conversion_runner_test;
